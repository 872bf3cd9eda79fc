//! Request and response types for the SpeakAI backend API.
//!
//! The backend returns different analysis payloads depending on which scoring
//! pipeline processed the upload, so results are modelled as one typed
//! variant per analysis kind rather than an open-ended JSON object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which backend scoring pipeline should process an uploaded recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// One-time self-introduction proficiency assessment
    Intro,
    /// Reading-practice pronunciation and fluency scoring
    Reading,
}

impl AnalysisKind {
    /// Query-parameter value understood by the analyze-speech endpoint.
    pub fn as_query_value(&self) -> &'static str {
        match self {
            AnalysisKind::Intro => "intro",
            AnalysisKind::Reading => "reading",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_value())
    }
}

/// Access and refresh tokens issued at login/signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Current user profile as returned by `GET /user/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "streakDays", default)]
    pub streak_days: u32,
    #[serde(rename = "xpPoints", default)]
    pub xp_points: u64,
}

/// Response body shared by `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: AuthTokens,
}

/// Body for `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Answer map accumulated by the onboarding questionnaire, keyed by prompt.
    pub onboarding: BTreeMap<String, Vec<String>>,
}

/// Body for `POST /auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `POST /auth/logout`.
#[derive(Debug, Serialize)]
pub struct LogoutRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Partial profile update for `PATCH /user`. Absent fields are left unchanged.
#[derive(Debug, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "xpPoints", skip_serializing_if = "Option::is_none")]
    pub xp_points: Option<u64>,
}

/// Result of a self-introduction analysis (`type=intro`).
#[derive(Debug, Clone, Deserialize)]
pub struct IntroResult {
    pub fluency: u8,
    pub pronunciation: u8,
    pub vocabulary: u8,
    pub overall: u8,
    pub feedback: String,
}

/// A single detected error within the transcribed reading.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechError {
    pub incorrect: String,
    pub correction: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: ErrorPosition,
    pub context: String,
}

/// Character span of a detected error inside the full transcription.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ErrorPosition {
    pub start: usize,
    pub end: usize,
}

/// Transcription annotated with the errors found in it.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatedText {
    pub full_text: String,
    #[serde(default)]
    pub errors: Vec<SpeechError>,
}

/// Result of a reading-practice analysis (`type=reading`).
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingResult {
    pub pronunciation_score: u8,
    pub fluency_score: u8,
    pub feedback: String,
    pub text_with_errors: AnnotatedText,
    /// Improvement categories (articles, plurals, verb forms, ...) mapped to
    /// the phrases that exhibited them.
    #[serde(default)]
    pub areas_to_improve: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub key_errors: Vec<String>,
}

/// A parsed analysis result, tagged by the pipeline that produced it.
#[derive(Debug, Clone)]
pub enum AnalysisResult {
    Intro(IntroResult),
    Reading(ReadingResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_result_parses_backend_payload() {
        let payload = r#"{
            "pronunciation_score": 8,
            "fluency_score": 7,
            "feedback": "Good attempt with minor grammatical errors",
            "text_with_errors": {
                "full_text": "Consistency are the key to master any skill.",
                "errors": [
                    {
                        "incorrect": "are",
                        "correction": "is",
                        "type": "verb_form",
                        "position": { "start": 12, "end": 15 },
                        "context": "Consistency are the key"
                    }
                ]
            },
            "areas_to_improve": {
                "verb_forms": ["Consistency are the key"]
            },
            "key_errors": ["Incorrect verb form 'are' instead of 'is'"]
        }"#;

        let result: ReadingResult = serde_json::from_str(payload).unwrap();
        assert_eq!(result.pronunciation_score, 8);
        assert_eq!(result.fluency_score, 7);
        assert_eq!(result.text_with_errors.errors.len(), 1);
        assert_eq!(result.text_with_errors.errors[0].correction, "is");
        assert_eq!(result.text_with_errors.errors[0].position.start, 12);
        assert_eq!(result.areas_to_improve["verb_forms"].len(), 1);
    }

    #[test]
    fn intro_result_parses_backend_payload() {
        let payload = r#"{
            "fluency": 85,
            "pronunciation": 78,
            "vocabulary": 92,
            "overall": 85,
            "feedback": "Great clarity and natural flow."
        }"#;

        let result: IntroResult = serde_json::from_str(payload).unwrap();
        assert_eq!(result.overall, 85);
        assert_eq!(result.vocabulary, 92);
    }

    #[test]
    fn profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            name: Some("Mia".to_string()),
            xp_points: None,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"name":"Mia"}"#);
    }
}
