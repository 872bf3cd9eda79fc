//! Speech analysis submission.
//!
//! Turns a finished recording artifact into a backend analysis result:
//! connectivity pre-flight, health probe, multipart upload, and error
//! classification. Every call is a fresh request; there is no retry queue
//! and no client-side cache, so duplicate submissions of the same artifact
//! each create a new backend invocation.

use crate::api::client::{ApiClient, ApiError};
use crate::api::models::{AnalysisKind, AnalysisResult, IntroResult, ReadingResult};
use reqwest::{Method, StatusCode};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Classified failures of a speech analysis submission.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("No internet connection. Please check your network and try again.")]
    NetworkUnavailable,
    #[error("The SpeakAI server is not responding. Please try again later.")]
    ServerUnreachable,
    #[error("The recording is too large to analyze. Try a shorter recording.")]
    FileTooLarge,
    #[error("The recording format is not supported by the server.")]
    UnsupportedFormat,
    #[error("Your session has expired. Please log in again.")]
    SessionExpired,
    #[error("Failed to analyze the recording: {0}")]
    Failed(String),
}

/// Device network reachability check, performed before any HTTP traffic.
pub trait Connectivity {
    /// Returns whether the given host appears reachable from this device.
    fn is_online(&self, host: &str, port: u16) -> bool;
}

/// Reachability via a short-timeout TCP connect to the backend host.
pub struct TcpConnectivity {
    timeout: Duration,
}

impl TcpConnectivity {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

impl Default for TcpConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity for TcpConnectivity {
    fn is_online(&self, host: &str, port: u16) -> bool {
        let addrs = match (host, port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!("DNS resolution failed for {host}:{port}: {e}");
                return false;
            }
        };
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                return true;
            }
        }
        false
    }
}

/// Maps an upload rejection status to its classified error.
fn classify_status(status: StatusCode, message: &str) -> AnalyzeError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => AnalyzeError::FileTooLarge,
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AnalyzeError::UnsupportedFormat,
        _ => AnalyzeError::Failed(format!("server returned status {status}: {message}")),
    }
}

fn map_api_error(error: ApiError) -> AnalyzeError {
    match error {
        ApiError::SessionExpired => AnalyzeError::SessionExpired,
        ApiError::Status { status, message } => {
            match StatusCode::from_u16(status) {
                Ok(status) => classify_status(status, &message),
                Err(_) => AnalyzeError::Failed(message),
            }
        }
        ApiError::Network(e) => AnalyzeError::Failed(e.to_string()),
    }
}

/// Packages a recording into a multipart upload and classifies the outcome.
pub struct SubmissionClient<'a> {
    api: &'a ApiClient,
    connectivity: Box<dyn Connectivity>,
    upload_timeout: Duration,
}

impl<'a> SubmissionClient<'a> {
    pub fn new(
        api: &'a ApiClient,
        connectivity: Box<dyn Connectivity>,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            api,
            connectivity,
            upload_timeout,
        }
    }

    /// Submits a recording for analysis.
    ///
    /// The caller guarantees that `artifact` points at a finished recording.
    /// The request is sent once with no retry; the pre-flight checks run
    /// before any upload traffic so an unreachable network fails fast.
    pub async fn submit(
        &self,
        artifact: &Path,
        kind: AnalysisKind,
    ) -> Result<AnalysisResult, AnalyzeError> {
        // Connectivity pre-flight: fail before any HTTP traffic when offline.
        let (host, port) = self
            .api
            .host_and_port()
            .ok_or(AnalyzeError::NetworkUnavailable)?;
        if !self.connectivity.is_online(&host, port) {
            tracing::warn!("Submission aborted: {host}:{port} unreachable");
            return Err(AnalyzeError::NetworkUnavailable);
        }

        // Health probe before the (potentially large) upload.
        if let Err(e) = self.api.health_check().await {
            tracing::warn!("Health probe failed: {e}");
            return Err(AnalyzeError::ServerUnreachable);
        }

        let audio_data = std::fs::read(artifact)
            .map_err(|e| AnalyzeError::Failed(format!("failed to read recording: {e}")))?;
        let filename = artifact
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "recording.m4a".to_string());

        let file_part = reqwest::multipart::Part::bytes(audio_data)
            .file_name(filename.clone())
            .mime_str("audio/mp4")
            .map_err(|e| AnalyzeError::Failed(format!("failed to build upload: {e}")))?;
        let form = reqwest::multipart::Form::new().part("audio", file_part);

        let path = "/user/analyze-speech";
        tracing::info!("Uploading {filename} for {kind} analysis");

        let response = self
            .api
            .request(Method::POST, path)
            .query(&[("type", kind.as_query_value())])
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| AnalyzeError::Failed(e.to_string()))?;
        let response = self
            .api
            .check(path, response)
            .await
            .map_err(map_api_error)?;

        let result = match kind {
            AnalysisKind::Intro => {
                let intro: IntroResult = response
                    .json()
                    .await
                    .map_err(|e| AnalyzeError::Failed(format!("unexpected response: {e}")))?;
                AnalysisResult::Intro(intro)
            }
            AnalysisKind::Reading => {
                let reading: ReadingResult = response
                    .json()
                    .await
                    .map_err(|e| AnalyzeError::Failed(format!("unexpected response: {e}")))?;
                AnalysisResult::Reading(reading)
            }
        };

        tracing::info!("Analysis completed for {filename}");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthSession, SessionStore};
    use crate::config::ServerConfig;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Offline {
        probed: Rc<Cell<bool>>,
    }

    impl Connectivity for Offline {
        fn is_online(&self, _host: &str, _port: u16) -> bool {
            self.probed.set(true);
            false
        }
    }

    #[test]
    fn status_413_is_file_too_large() {
        let err = classify_status(StatusCode::PAYLOAD_TOO_LARGE, "");
        assert!(matches!(err, AnalyzeError::FileTooLarge));
    }

    #[test]
    fn status_415_is_unsupported_format() {
        let err = classify_status(StatusCode::UNSUPPORTED_MEDIA_TYPE, "");
        assert!(matches!(err, AnalyzeError::UnsupportedFormat));
    }

    #[test]
    fn other_statuses_are_generic_failures() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        match err {
            AnalyzeError::Failed(message) => assert!(message.contains("500")),
            other => panic!("expected generic failure, got {other:?}"),
        }
    }

    #[test]
    fn expired_session_maps_through() {
        let err = map_api_error(ApiError::SessionExpired);
        assert!(matches!(err, AnalyzeError::SessionExpired));
    }

    #[tokio::test]
    async fn offline_submission_never_issues_http() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(AuthSession::new(SessionStore::new(dir.path()).unwrap()));
        session.restore().unwrap();
        // Unroutable address: any attempted HTTP call would surface as a
        // network error rather than NetworkUnavailable.
        let server = ServerConfig {
            base_url: "http://192.0.2.1:9".to_string(),
            ..ServerConfig::default()
        };
        let api = ApiClient::new(&server, session).unwrap();

        let probed = Rc::new(Cell::new(false));
        let submission = SubmissionClient::new(
            &api,
            Box::new(Offline {
                probed: Rc::clone(&probed),
            }),
            Duration::from_secs(1),
        );

        let artifact = dir.path().join("take.m4a");
        std::fs::write(&artifact, b"not really audio").unwrap();

        let err = submission
            .submit(&artifact, AnalysisKind::Reading)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalyzeError::NetworkUnavailable));
        assert!(probed.get());
    }
}
