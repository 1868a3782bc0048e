//! Batch text-to-speech over the voice API's REST endpoint.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use voice_relay_core::{SpeechAudio, SpeechSynthesizer};

pub const DEFAULT_SPEECH_URL: &str = "https://api.sarvam.ai/text-to-speech";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    target_language_code: &'a str,
}

/// Calls the text-to-speech endpoint, authenticating with the subscription key
/// header the REST API expects.
#[derive(Debug)]
pub struct SpeechClient {
    endpoint: String,
    credential: SecretString,
    client: reqwest::Client,
}

impl SpeechClient {
    pub fn new(endpoint: impl Into<String>, credential: SecretString) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            endpoint: endpoint.into(),
            credential,
            client,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str, target_language_code: &str) -> Result<SpeechAudio> {
        debug!(chars = text.chars().count(), target_language_code, "Requesting speech");
        let res = self
            .client
            .post(&self.endpoint)
            .header("api-subscription-key", self.credential.expose_secret())
            .json(&SpeechRequest {
                text,
                target_language_code,
            })
            .send()
            .await
            .context("Text-to-speech request failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, %body, "Text-to-speech service rejected the request");
            bail!("Text-to-speech service returned {}", status);
        }
        res.json::<SpeechAudio>()
            .await
            .context("Text-to-speech response was not understood")
    }
}
