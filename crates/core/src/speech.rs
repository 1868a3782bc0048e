use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Language used when the caller does not choose one.
pub const DEFAULT_SPEECH_LANGUAGE: &str = "hi-IN";

/// Audio returned by a text-to-speech backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAudio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Base64-encoded audio clips, in playback order.
    pub audios: Vec<String>,
}

/// A one-shot text-to-speech backend.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Renders `text` as speech in the given BCP-47 language, e.g. `hi-IN`.
    async fn synthesize(&self, text: &str, target_language_code: &str) -> Result<SpeechAudio>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_audio_tolerates_missing_request_id() {
        let audio: SpeechAudio = serde_json::from_str(r#"{"audios":["UklGRg=="]}"#).unwrap();
        assert_eq!(audio.request_id, None);
        assert_eq!(audio.audios, vec!["UklGRg==".to_string()]);

        let json = serde_json::to_value(&audio).unwrap();
        assert!(json.get("request_id").is_none());
    }
}
