//! Sign out and clear the stored session.

use crate::api::ApiClient;
use crate::auth::AuthSession;
use console::style;

/// Handles sign-out.
///
/// The server is notified on a best-effort basis; the local session is
/// cleared even when the server call fails or no cached profile exists, so
/// a dead backend or a corrupt profile can never trap a user in a
/// signed-in state.
pub async fn handle_logout(api: &ApiClient, session: &AuthSession) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Logout ===");

    if !session.is_authenticated() {
        println!("{}", style("You are not signed in.").dim());
        return Ok(());
    }

    // The server call needs the user id from the cached profile; without
    // one the notification is skipped but local state is still cleared.
    match session.user() {
        Some(user) => {
            if let Err(e) = api.logout(&user.id).await {
                tracing::warn!("Server logout failed, clearing local session anyway: {e}");
            }
        }
        None => {
            tracing::warn!("No cached profile; skipping server logout notification");
        }
    }

    session.clear_local()?;
    println!("{}", style("Signed out.").green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SessionStore, StoredSession};
    use crate::config::ServerConfig;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn client_for(dir: &TempDir, session: Arc<AuthSession>) -> ApiClient {
        // Unroutable address: any attempted server call would fail loudly.
        let server = ServerConfig {
            base_url: "http://192.0.2.1:9".to_string(),
            ..ServerConfig::default()
        };
        ApiClient::new(&server, session).unwrap()
    }

    #[tokio::test]
    async fn logout_with_tokens_but_no_profile_clears_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path()).unwrap();
        store
            .save(&StoredSession {
                access_token: Some("abc".to_string()),
                refresh_token: Some("def".to_string()),
                user_json: None,
                intro_completed: false,
            })
            .unwrap();

        let session = Arc::new(AuthSession::new(SessionStore::new(dir.path()).unwrap()));
        session.restore().unwrap();
        assert!(session.is_authenticated());
        assert!(session.user().is_none());

        let api = client_for(&dir, Arc::clone(&session));
        handle_logout(&api, &session).await.unwrap();

        assert!(!session.is_authenticated());
        // The persisted session is gone too, not just the in-memory copy
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn logout_while_signed_out_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(AuthSession::new(SessionStore::new(dir.path()).unwrap()));
        session.restore().unwrap();

        let api = client_for(&dir, Arc::clone(&session));
        handle_logout(&api, &session).await.unwrap();
        assert!(!session.is_authenticated());
    }
}
