//! Authentication session state machine.
//!
//! The session is the single writer of authentication state: it restores
//! persisted tokens at startup, records successful login/signup, clears
//! state on logout, and reacts to the out-of-band session-expired signal
//! raised when any authenticated request receives HTTP 401. Consumers read
//! projections (`is_authenticated`, `access_token`) and may subscribe to
//! the expiry channel; only the HTTP layer calls `note_unauthorized`.

use crate::api::models::{AuthResponse, AuthTokens, UserProfile};
use crate::auth::store::{SessionStore, StoredSession};
use anyhow::Result;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Lifecycle phase of the authentication session.
///
/// `Loading` lasts only until `restore()` has read the persisted state;
/// no authenticated operation may run while the phase is `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Loading,
    Unauthenticated,
    Authenticated,
}

#[derive(Default)]
struct SessionInner {
    tokens: Option<AuthTokens>,
    user: Option<UserProfile>,
    intro_completed: bool,
    restored: bool,
}

/// Process-wide authentication session.
pub struct AuthSession {
    store: SessionStore,
    inner: Mutex<SessionInner>,
    expired_tx: broadcast::Sender<()>,
}

impl AuthSession {
    /// Creates a session in the `Loading` phase backed by the given store.
    pub fn new(store: SessionStore) -> Self {
        let (expired_tx, _) = broadcast::channel(4);
        Self {
            store,
            inner: Mutex::new(SessionInner::default()),
            expired_tx,
        }
    }

    /// Restores persisted tokens and profile. Must complete before any
    /// authenticated command runs.
    ///
    /// # Errors
    /// - If the persisted session file cannot be read or parsed
    pub fn restore(&self) -> Result<()> {
        let stored = self.store.load()?;
        let mut inner = self.inner.lock().unwrap();

        inner.tokens = match (stored.access_token, stored.refresh_token) {
            (Some(access_token), Some(refresh_token)) => Some(AuthTokens {
                access_token,
                refresh_token,
            }),
            // A lone token is treated as absent; the session is never
            // partially authenticated.
            _ => None,
        };
        inner.user = stored
            .user_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok());
        inner.intro_completed = stored.intro_completed;
        inner.restored = true;

        tracing::debug!(
            "Session restored: authenticated={}",
            inner.tokens.is_some()
        );
        Ok(())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> AuthPhase {
        let inner = self.inner.lock().unwrap();
        if !inner.restored {
            AuthPhase::Loading
        } else if inner.tokens.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Unauthenticated
        }
    }

    /// True exactly when an access token is present.
    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().unwrap().tokens.is_some()
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// Last known user profile.
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.lock().unwrap().user.clone()
    }

    /// Whether the one-time self-introduction analysis has been completed.
    pub fn intro_completed(&self) -> bool {
        self.inner.lock().unwrap().intro_completed
    }

    /// Records a successful login/signup: tokens and profile are persisted
    /// and the session becomes authenticated.
    ///
    /// # Errors
    /// - If the session cannot be written to disk
    pub fn establish(&self, response: &AuthResponse) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.tokens = Some(response.tokens.clone());
        inner.user = Some(response.user.clone());
        inner.restored = true;

        self.store.save(&StoredSession {
            access_token: Some(response.tokens.access_token.clone()),
            refresh_token: Some(response.tokens.refresh_token.clone()),
            user_json: Some(serde_json::to_string(&response.user)?),
            intro_completed: inner.intro_completed,
        })?;

        tracing::info!("Authenticated as {}", response.user.email);
        Ok(())
    }

    /// Updates the cached profile after a `GET /user/me` or profile update.
    ///
    /// # Errors
    /// - If the session cannot be written to disk
    pub fn update_user(&self, user: &UserProfile) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.user = Some(user.clone());
        let Some(tokens) = inner.tokens.clone() else {
            return Ok(());
        };
        self.store.save(&StoredSession {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            user_json: Some(serde_json::to_string(user)?),
            intro_completed: inner.intro_completed,
        })
    }

    /// Marks the one-time intro analysis as done and persists the flag.
    ///
    /// # Errors
    /// - If the session cannot be written to disk
    pub fn mark_intro_completed(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.intro_completed = true;
        let Some(tokens) = inner.tokens.clone() else {
            return Ok(());
        };
        let user_json = inner
            .user
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.store.save(&StoredSession {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            user_json,
            intro_completed: true,
        })
    }

    /// Clears all local authentication state (tokens, profile, flags).
    ///
    /// # Errors
    /// - If the persisted session cannot be removed
    pub fn clear_local(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.tokens = None;
        inner.user = None;
        inner.intro_completed = false;
        inner.restored = true;
        self.store.clear()
    }

    /// Called by the HTTP layer when an authenticated request receives 401.
    ///
    /// Clears the stored tokens and broadcasts the session-expired signal
    /// exactly once per call. Subscribers that lag or have dropped their
    /// receiver are ignored.
    pub fn note_unauthorized(&self) {
        if let Err(e) = self.clear_local() {
            tracing::warn!("Failed to clear session after 401: {}", e);
        }
        tracing::info!("Session expired: access token cleared");
        let _ = self.expired_tx.send(());
    }

    /// Subscribes to the session-expired signal.
    pub fn subscribe_expired(&self) -> broadcast::Receiver<()> {
        self.expired_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session_with_token(dir: &TempDir, token: Option<&str>) -> AuthSession {
        let store = SessionStore::new(dir.path()).unwrap();
        if let Some(token) = token {
            store
                .save(&StoredSession {
                    access_token: Some(token.to_string()),
                    refresh_token: Some("refresh".to_string()),
                    user_json: None,
                    intro_completed: false,
                })
                .unwrap();
        }
        AuthSession::new(SessionStore::new(dir.path()).unwrap())
    }

    #[test]
    fn starts_in_loading_phase() {
        let dir = TempDir::new().unwrap();
        let session = session_with_token(&dir, None);
        assert_eq!(session.phase(), AuthPhase::Loading);
    }

    #[test]
    fn restore_of_persisted_token_authenticates() {
        let dir = TempDir::new().unwrap();
        let session = session_with_token(&dir, Some("abc"));

        session.restore().unwrap();

        assert_eq!(session.phase(), AuthPhase::Authenticated);
        assert!(session.is_authenticated());
        assert_eq!(session.access_token().as_deref(), Some("abc"));
    }

    #[test]
    fn restore_without_token_is_unauthenticated() {
        let dir = TempDir::new().unwrap();
        let session = session_with_token(&dir, None);

        session.restore().unwrap();

        assert_eq!(session.phase(), AuthPhase::Unauthenticated);
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
    }

    #[test]
    fn lone_access_token_without_refresh_counts_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store
            .save(&StoredSession {
                access_token: Some("abc".to_string()),
                refresh_token: None,
                user_json: None,
                intro_completed: false,
            })
            .unwrap();

        let session = AuthSession::new(SessionStore::new(dir.path()).unwrap());
        session.restore().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn unauthorized_clears_token_and_signals_once() {
        let dir = TempDir::new().unwrap();
        let session = session_with_token(&dir, Some("abc"));
        session.restore().unwrap();

        let mut rx = session.subscribe_expired();
        session.note_unauthorized();

        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
        // Exactly one signal was broadcast
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        // The persisted session is gone as well
        let reloaded = SessionStore::new(dir.path()).unwrap().load().unwrap();
        assert!(reloaded.access_token.is_none());
    }
}
