//! API Models
//!
//! Request and response bodies for the HTTP routes, annotated for OpenAPI
//! generation with `utoipa`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use voice_relay_core::{SessionRecord, SessionState, SpeechAudio};

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Closing,
    Closed,
}

impl From<SessionState> for SessionStatus {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Active => SessionStatus::Active,
            SessionState::Closing => SessionStatus::Closing,
            SessionState::Closed => SessionStatus::Closed,
        }
    }
}

/// A live relay session as reported by `GET /api/sessions`.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ActiveSession {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    #[schema(example = "transcribe")]
    pub route: String,
    #[schema(value_type = String, example = "active")]
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<SessionRecord> for ActiveSession {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            route: record.route,
            status: record.state.into(),
            created_at: record.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    #[schema(example = "How do I open a parliamentary debate?")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TextToSpeechRequest {
    #[schema(example = "Namaste, aaj ka vishay hai...")]
    pub text: Option<String>,
    #[schema(example = "hi-IN")]
    pub target_language_code: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct TextToSpeechResponse {
    /// `{request_id, audios: [base64 WAV]}` as returned by the speech service.
    #[schema(value_type = Object)]
    pub audio: SpeechAudio,
}

#[derive(Deserialize, ToSchema)]
pub struct LearningRequest {
    #[schema(example = "Social media does more harm than good.")]
    pub transcript: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct LearningResponse {
    pub answer: String,
    #[schema(value_type = Object)]
    pub audio: SpeechAudio,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
