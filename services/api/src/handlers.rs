//! Axum Handlers for the REST API
//!
//! Health, live-session listing, the one-shot chat endpoint and the batch
//! speech endpoints. Each handler carries a `utoipa` annotation for the
//! OpenAPI document.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};
use voice_relay_core::speech::DEFAULT_SPEECH_LANGUAGE;

use crate::{
    models::{
        ActiveSession, ChatRequest, ChatResponse, ErrorResponse, HealthResponse, LearningRequest,
        LearningResponse, TextToSpeechRequest, TextToSpeechResponse,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    /// The chat backend failed; details are logged, not returned.
    ChatUnavailable(anyhow::Error),
    /// The speech backend failed; only the outermost context is returned.
    SpeechUnavailable(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::ChatUnavailable(err) => {
                error!("Chat request failed: {:?}", err);
                let error = "Failed to get response from AI service".to_string();
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })).into_response()
            }
            ApiError::SpeechUnavailable(err) => {
                error!("Speech request failed: {:?}", err);
                let error = err.to_string();
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}

/// A present, non-empty string field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// List the relay sessions that are currently open, oldest first.
#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Live relay sessions", body = [ActiveSession])
    )
)]
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<ActiveSession>> {
    let sessions = state
        .sessions
        .snapshot()
        .into_iter()
        .map(ActiveSession::from)
        .collect();
    Json(sessions)
}

/// Ask the assistant a single question and get one reply.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Message missing", body = ErrorResponse),
        (status = 500, description = "Chat backend failed", body = ErrorResponse)
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload
        .message
        .ok_or_else(|| ApiError::BadRequest("Message not provided".to_string()))?;

    info!(chars = message.chars().count(), "Chat request received");
    let reply = state
        .chat_client
        .reply(&state.system_prompt, &message)
        .await
        .map_err(ApiError::ChatUnavailable)?;

    Ok(Json(ChatResponse { reply }))
}

/// Convert a piece of text to speech in one request.
#[utoipa::path(
    post,
    path = "/api/text-to-speech",
    request_body = TextToSpeechRequest,
    responses(
        (status = 200, description = "Synthesized audio", body = TextToSpeechResponse),
        (status = 400, description = "Text or language missing", body = ErrorResponse),
        (status = 500, description = "Speech backend failed", body = ErrorResponse)
    )
)]
pub async fn text_to_speech(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TextToSpeechRequest>,
) -> Result<Json<TextToSpeechResponse>, ApiError> {
    let (Some(text), Some(target_language_code)) = (
        non_empty(payload.text),
        non_empty(payload.target_language_code),
    ) else {
        return Err(ApiError::BadRequest(
            "text and target_language_code required".to_string(),
        ));
    };

    let audio = state
        .speech
        .synthesize(&text, &target_language_code)
        .await
        .map_err(ApiError::SpeechUnavailable)?;

    Ok(Json(TextToSpeechResponse { audio }))
}

/// Answer a learning-mode transcript with a follow-up question, spoken aloud.
#[utoipa::path(
    post,
    path = "/api/learning-ai",
    request_body = LearningRequest,
    responses(
        (status = 200, description = "Spoken follow-up", body = LearningResponse),
        (status = 400, description = "Transcript missing", body = ErrorResponse),
        (status = 500, description = "Speech backend failed", body = ErrorResponse)
    )
)]
pub async fn learning_ai(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LearningRequest>,
) -> Result<Json<LearningResponse>, ApiError> {
    let transcript = non_empty(payload.transcript)
        .ok_or_else(|| ApiError::BadRequest("transcript is required".to_string()))?;

    let answer = format!(
        "You said: \"{}\". That's an interesting point. When considering this, have you thought about the long-term implications?",
        transcript
    );
    let audio = state
        .speech
        .synthesize(&answer, DEFAULT_SPEECH_LANGUAGE)
        .await
        .map_err(ApiError::SpeechUnavailable)?;

    Ok(Json(LearningResponse { answer, audio }))
}
