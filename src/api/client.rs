//! Authenticated HTTP client for the SpeakAI backend.
//!
//! Wraps a `reqwest` client with the backend base URL, bearer-token
//! attachment, and uniform response checking. The bearer token is attached
//! to every request except a fixed allow-list of public endpoints
//! (registration, login, health). Any authenticated request answered with
//! HTTP 401 clears the local session and broadcasts the session-expired
//! signal before the error is returned to the caller.

use crate::api::models::{
    AuthResponse, LoginRequest, LogoutRequest, ProfileUpdate, SignupRequest, UserProfile,
};
use crate::auth::AuthSession;
use crate::config::ServerConfig;
use anyhow::Result;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Endpoints that never carry a bearer token.
const PUBLIC_PATHS: &[&str] = &["/auth/register", "/auth/login", "/health"];

/// Errors surfaced by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,
    #[error("SpeakAI server error (status {status}): {message}")]
    Status { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Returns whether a path belongs to the public (unauthenticated) allow-list.
fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Thin authenticated client over the backend REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    health_timeout: Duration,
    session: Arc<AuthSession>,
}

impl ApiClient {
    /// Creates a client for the configured server.
    ///
    /// # Errors
    /// - If the configured base URL is not a valid URL
    pub fn new(server: &ServerConfig, session: Arc<AuthSession>) -> Result<Self> {
        let base_url = Url::parse(&server.effective_base_url())
            .map_err(|e| anyhow::anyhow!("Invalid server base URL: {e}"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            health_timeout: Duration::from_secs(server.health_timeout_secs),
            session,
        })
    }

    /// Host and port of the backend, for the connectivity pre-flight.
    pub fn host_and_port(&self) -> Option<(String, u16)> {
        let host = self.base_url.host_str()?.to_string();
        let port = self
            .base_url
            .port()
            .unwrap_or(if self.base_url.scheme() == "https" { 443 } else { 80 });
        Some((host, port))
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// Builds a request for the given path, attaching the bearer token
    /// unless the path is on the public allow-list.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        if is_public_path(path) {
            return builder;
        }
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Handles a non-success status for the given path.
    ///
    /// A 401 on an authenticated path clears the session and raises the
    /// process-wide expiry signal.
    fn note_status(&self, path: &str, status: StatusCode, message: String) -> ApiError {
        if status == StatusCode::UNAUTHORIZED && !is_public_path(path) {
            self.session.note_unauthorized();
            return ApiError::SessionExpired;
        }
        ApiError::Status {
            status: status.as_u16(),
            message,
        }
    }

    /// Checks a response, converting non-success statuses into [`ApiError`].
    pub(crate) async fn check(&self, path: &str, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::error!(
            "Request failed: url={}, status={}, headers={:?}",
            response.url(),
            status,
            response.headers()
        );

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or(body);
        Err(self.note_status(path, status, message))
    }

    /// `POST /auth/register`: create an account.
    pub async fn register(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let path = "/auth/register";
        let response = self.request(Method::POST, path).json(request).send().await?;
        let response = self.check(path, response).await?;
        Ok(response.json().await?)
    }

    /// `POST /auth/login`: authenticate an existing account.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let path = "/auth/login";
        let response = self.request(Method::POST, path).json(request).send().await?;
        let response = self.check(path, response).await?;
        Ok(response.json().await?)
    }

    /// `POST /auth/logout`: invalidate the session server-side.
    pub async fn logout(&self, user_id: &str) -> Result<(), ApiError> {
        let path = "/auth/logout";
        let body = LogoutRequest {
            user_id: user_id.to_string(),
        };
        let response = self.request(Method::POST, path).json(&body).send().await?;
        self.check(path, response).await?;
        Ok(())
    }

    /// `GET /user/me`: fetch the current user profile and streak.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let path = "/user/me";
        let response = self.request(Method::GET, path).send().await?;
        let response = self.check(path, response).await?;
        Ok(response.json().await?)
    }

    /// `PATCH /user`: partial profile update.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile, ApiError> {
        let path = "/user";
        let response = self
            .request(Method::PATCH, path)
            .json(update)
            .send()
            .await?;
        let response = self.check(path, response).await?;
        Ok(response.json().await?)
    }

    /// `GET /health`: liveness probe used as the upload pre-flight.
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let path = "/health";
        let response = self
            .request(Method::GET, path)
            .timeout(self.health_timeout)
            .send()
            .await?;
        self.check(path, response).await?;
        Ok(())
    }
}

/// Pulls a `message` field out of a JSON error body, if present.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SessionStore, StoredSession};
    use tempfile::TempDir;

    fn authenticated_client(dir: &TempDir) -> (ApiClient, Arc<AuthSession>) {
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
        let server = ServerConfig {
            base_url: "http://localhost:9".to_string(),
            ..ServerConfig::default()
        };
        let client = ApiClient::new(&server, Arc::clone(&session)).unwrap();
        (client, session)
    }

    #[test]
    fn public_allow_list_covers_unauthenticated_endpoints() {
        assert!(is_public_path("/auth/register"));
        assert!(is_public_path("/auth/login"));
        assert!(is_public_path("/health"));
        assert!(!is_public_path("/user/me"));
        assert!(!is_public_path("/user/analyze-speech"));
    }

    #[test]
    fn unauthorized_on_private_path_expires_session() {
        let dir = TempDir::new().unwrap();
        let (client, session) = authenticated_client(&dir);
        let mut rx = session.subscribe_expired();

        let err = client.note_status("/user/me", StatusCode::UNAUTHORIZED, String::new());

        assert!(matches!(err, ApiError::SessionExpired));
        assert!(!session.is_authenticated());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unauthorized_on_public_path_does_not_expire_session() {
        let dir = TempDir::new().unwrap();
        let (client, session) = authenticated_client(&dir);
        let mut rx = session.subscribe_expired();

        let err = client.note_status(
            "/auth/login",
            StatusCode::UNAUTHORIZED,
            "bad credentials".to_string(),
        );

        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert!(session.is_authenticated());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn default_ports_follow_scheme() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(AuthSession::new(SessionStore::new(dir.path()).unwrap()));
        let server = ServerConfig {
            base_url: "https://api.speakai.app".to_string(),
            ..ServerConfig::default()
        };
        let client = ApiClient::new(&server, session).unwrap();
        assert_eq!(
            client.host_and_port(),
            Some(("api.speakai.app".to_string(), 443))
        );
    }

    #[test]
    fn extract_message_reads_json_error_bodies() {
        assert_eq!(
            extract_message(r#"{"message":"email already registered"}"#).as_deref(),
            Some("email already registered")
        );
        assert!(extract_message("not json").is_none());
    }
}
