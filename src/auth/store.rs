//! Persisted session state.
//!
//! Stores the access/refresh tokens, the serialized user profile, and the
//! one-time intro-analysis flag in a single JSON file under the user's data
//! directory. The file is written with owner-only permissions and removed
//! as a whole on logout so the client can never be left partially
//! authenticated across restarts.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk session contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Serialized `UserProfile` JSON as last returned by the backend
    pub user_json: Option<String>,
    /// Whether the one-time self-introduction analysis has been completed
    #[serde(default)]
    pub intro_completed: bool,
}

/// File-backed store for [`StoredSession`].
pub struct SessionStore {
    session_path: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at the given data directory.
    ///
    /// # Errors
    /// - If the data directory cannot be created
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            session_path: data_dir.join("session.json"),
        })
    }

    /// Creates a store under the default data directory (~/.local/share/speakai).
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".local")
            .join("share")
            .join("speakai");
        Self::new(&data_dir)
    }

    /// Loads the persisted session. A missing file yields the empty session.
    ///
    /// # Errors
    /// - If the file exists but cannot be read or parsed
    pub fn load(&self) -> Result<StoredSession> {
        if !self.session_path.exists() {
            return Ok(StoredSession::default());
        }
        let content = fs::read_to_string(&self.session_path)?;
        let session = serde_json::from_str(&content)?;
        Ok(session)
    }

    /// Writes the session to disk with owner-only permissions.
    ///
    /// # Errors
    /// - If the file cannot be written
    pub fn save(&self, session: &StoredSession) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.session_path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.session_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.session_path, perms)?;
        }

        tracing::debug!("Session saved to {}", self.session_path.display());
        Ok(())
    }

    /// Removes the session file, clearing tokens, profile, and flags at once.
    ///
    /// Clearing an already-absent session is a no-op.
    ///
    /// # Errors
    /// - If the file exists but cannot be removed
    pub fn clear(&self) -> Result<()> {
        if self.session_path.exists() {
            fs::remove_file(&self.session_path)?;
            tracing::info!("Session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        let session = store.load().unwrap();
        assert!(session.access_token.is_none());
        assert!(!session.intro_completed);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();

        let session = StoredSession {
            access_token: Some("abc".to_string()),
            refresh_token: Some("def".to_string()),
            user_json: Some(r#"{"_id":"u1"}"#.to_string()),
            intro_completed: true,
        };
        store.save(&session).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.access_token.as_deref(), Some("abc"));
        assert_eq!(loaded.refresh_token.as_deref(), Some("def"));
        assert!(loaded.intro_completed);
    }

    #[test]
    fn clear_removes_everything_at_once() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();

        store
            .save(&StoredSession {
                access_token: Some("abc".to_string()),
                ..StoredSession::default()
            })
            .unwrap();

        store.clear().unwrap();
        let loaded = store.load().unwrap();
        assert!(loaded.access_token.is_none());
        assert!(loaded.user_json.is_none());

        // Clearing again is a no-op
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store.save(&StoredSession::default()).unwrap();

        let mode = fs::metadata(dir.path().join("session.json"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
