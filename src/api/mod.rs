//! HTTP client for the SpeakAI backend.
//!
//! All scoring and error detection happens server-side; this module holds
//! the thin authenticated client, the speech-analysis submission pipeline,
//! and the typed request/response models.

pub mod analyze;
pub mod client;
pub mod models;

pub use analyze::{AnalyzeError, Connectivity, SubmissionClient, TcpConnectivity};
pub use client::{ApiClient, ApiError};
pub use models::{AnalysisKind, AnalysisResult};
