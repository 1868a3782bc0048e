//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API, the streaming WebSocket proxies, and OpenAPI
//! documentation.

use crate::{
    handlers,
    models::{
        ActiveSession, ChatRequest, ChatResponse, ErrorResponse, HealthResponse, LearningRequest,
        LearningResponse, SessionStatus, TextToSpeechRequest, TextToSpeechResponse,
    },
    state::AppState,
    ws::stream_handler,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_sessions,
        handlers::chat,
        handlers::text_to_speech,
        handlers::learning_ai,
    ),
    components(
        schemas(
            ActiveSession, SessionStatus, ChatRequest, ChatResponse, HealthResponse, ErrorResponse,
            TextToSpeechRequest, TextToSpeechResponse, LearningRequest, LearningResponse
        )
    ),
    tags(
        (name = "Voice Relay API", description = "Streaming voice proxies, chat and batch speech endpoints")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/chat", post(handlers::chat))
        .route("/api/text-to-speech", post(handlers::text_to_speech))
        .route("/api/learning-ai", post(handlers::learning_ai))
        .route("/api/streaming/{route}", get(stream_handler))
        .with_state(app_state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use mockall::mock;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tower::ServiceExt;
    use voice_relay_core::{SessionManager, SpeechAudio, SpeechSynthesizer, chat::ChatClient};

    mock! {
        Chat {}

        #[async_trait]
        impl ChatClient for Chat {
            async fn reply(&self, system_prompt: &str, message: &str) -> anyhow::Result<String>;
        }
    }

    mock! {
        Speech {}

        #[async_trait]
        impl SpeechSynthesizer for Speech {
            async fn synthesize(
                &self,
                text: &str,
                target_language_code: &str,
            ) -> anyhow::Result<SpeechAudio>;
        }
    }

    fn app_with(chat: MockChat, speech: MockSpeech) -> Router {
        create_router(Arc::new(AppState {
            sessions: SessionManager::default(),
            upstreams: Arc::new(HashMap::new()),
            speech: Arc::new(speech),
            chat_client: Arc::new(chat),
            system_prompt: Arc::new("You coach debaters.".to_string()),
        }))
    }

    fn app(chat: MockChat) -> Router {
        app_with(chat, MockSpeech::new())
    }

    fn speech_app(speech: MockSpeech) -> Router {
        app_with(MockChat::new(), speech)
    }

    fn clip(text: &str) -> SpeechAudio {
        SpeechAudio {
            request_id: Some("req-1".to_string()),
            audios: vec![format!("audio:{}", text)],
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_chat(body: Value) -> Request<Body> {
        post_json("/api/chat", body)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockChat::new())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_sessions_empty_at_startup() {
        let response = app(MockChat::new())
            .oneshot(Request::get("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_chat_returns_reply() {
        let mut chat = MockChat::new();
        chat.expect_reply()
            .withf(|system_prompt, message| {
                system_prompt == "You coach debaters." && message == "What is a rebuttal?"
            })
            .times(1)
            .returning(|_, _| Ok("A direct answer to the opposing case.".to_string()));

        let response = app(chat)
            .oneshot(post_chat(json!({"message": "What is a rebuttal?"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"reply": "A direct answer to the opposing case."})
        );
    }

    #[tokio::test]
    async fn test_chat_rejects_missing_message() {
        for body in [json!({}), json!({"message": null})] {
            let mut chat = MockChat::new();
            chat.expect_reply().times(0);

            let response = app(chat).oneshot(post_chat(body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({"error": "Message not provided"})
            );
        }
    }

    #[tokio::test]
    async fn test_chat_forwards_blank_message_unchanged() {
        let mut chat = MockChat::new();
        chat.expect_reply()
            .withf(|_, message| message == "   ")
            .times(1)
            .returning(|_, _| Ok("Could you say more?".to_string()));

        let response = app(chat)
            .oneshot(post_chat(json!({"message": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"reply": "Could you say more?"}));
    }

    #[tokio::test]
    async fn test_chat_backend_failure_is_500() {
        let mut chat = MockChat::new();
        chat.expect_reply()
            .returning(|_, _| Err(anyhow!("connection refused")));

        let response = app(chat)
            .oneshot(post_chat(json!({"message": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(
            body,
            json!({"error": "Failed to get response from AI service"})
        );
    }

    #[tokio::test]
    async fn test_text_to_speech_returns_audio() {
        let mut speech = MockSpeech::new();
        speech
            .expect_synthesize()
            .withf(|text, language| text == "Namaste" && language == "hi-IN")
            .times(1)
            .returning(|text, _| Ok(clip(text)));

        let response = speech_app(speech)
            .oneshot(post_json(
                "/api/text-to-speech",
                json!({"text": "Namaste", "target_language_code": "hi-IN"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"audio": {"request_id": "req-1", "audios": ["audio:Namaste"]}})
        );
    }

    #[tokio::test]
    async fn test_text_to_speech_requires_text_and_language() {
        for body in [
            json!({}),
            json!({"text": "Namaste"}),
            json!({"target_language_code": "hi-IN"}),
            json!({"text": "", "target_language_code": "hi-IN"}),
        ] {
            let mut speech = MockSpeech::new();
            speech.expect_synthesize().times(0);

            let response = speech_app(speech)
                .oneshot(post_json("/api/text-to-speech", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({"error": "text and target_language_code required"})
            );
        }
    }

    #[tokio::test]
    async fn test_text_to_speech_failure_is_500_with_error() {
        let mut speech = MockSpeech::new();
        speech
            .expect_synthesize()
            .returning(|_, _| Err(anyhow!("Text-to-speech service returned 503")));

        let response = speech_app(speech)
            .oneshot(post_json(
                "/api/text-to-speech",
                json!({"text": "Namaste", "target_language_code": "hi-IN"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Text-to-speech service returned 503"})
        );
    }

    #[tokio::test]
    async fn test_learning_ai_speaks_follow_up_in_hindi() {
        let mut speech = MockSpeech::new();
        speech
            .expect_synthesize()
            .withf(|text, language| {
                text.starts_with("You said: \"Homework should be banned\".") && language == "hi-IN"
            })
            .times(1)
            .returning(|_, _| Ok(clip("follow-up")));

        let response = speech_app(speech)
            .oneshot(post_json(
                "/api/learning-ai",
                json!({"transcript": "Homework should be banned"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(
            body["answer"]
                .as_str()
                .unwrap()
                .ends_with("have you thought about the long-term implications?")
        );
        assert_eq!(body["audio"]["audios"][0], "audio:follow-up");
    }

    #[tokio::test]
    async fn test_learning_ai_requires_transcript() {
        for body in [json!({}), json!({"transcript": ""})] {
            let mut speech = MockSpeech::new();
            speech.expect_synthesize().times(0);

            let response = speech_app(speech)
                .oneshot(post_json("/api/learning-ai", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({"error": "transcript is required"})
            );
        }
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let response = app(MockChat::new())
            .oneshot(
                Request::get("/api/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/health",
            "/api/sessions",
            "/api/chat",
            "/api/text-to-speech",
            "/api/learning-ai",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }

        let response = app(MockChat::new())
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
