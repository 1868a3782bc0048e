//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the session
//! registry, one upstream connector per stream route, the speech client and
//! the chat client.

use crate::config::{Config, StreamRoute};
use anyhow::Context;
use async_openai::config::OpenAIConfig;
use secrecy::{ExposeSecret, SecretString};
use std::{collections::HashMap, sync::Arc};
use voice_relay_core::{
    Relay, SessionManager, SpeechSynthesizer, UpstreamConnector,
    chat::{ChatClient, OpenAICompatibleChat},
};
use voice_upstream::{SpeechClient, UpstreamClient};

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub upstreams: Arc<HashMap<StreamRoute, Arc<dyn UpstreamConnector>>>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub chat_client: Arc<dyn ChatClient>,
    pub system_prompt: Arc<String>,
}

impl AppState {
    /// Builds the state from loaded configuration: one upstream client per
    /// route, all sharing the same credential, plus the speech and chat clients.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let upstreams = StreamRoute::ALL
            .into_iter()
            .map(|route| {
                let credential = SecretString::from(config.api_key.expose_secret().to_string());
                let client = UpstreamClient::new(config.upstream_url(route), credential)
                    .with_connect_timeout(config.connect_timeout);
                (route, Arc::new(client) as Arc<dyn UpstreamConnector>)
            })
            .collect();

        let speech = SpeechClient::new(
            config.speech_url.as_str(),
            SecretString::from(config.api_key.expose_secret().to_string()),
        )
        .context("Failed to build text-to-speech client")?;

        let chat_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.chat_api_base);

        Ok(Self {
            sessions: SessionManager::new(Relay::new(config.send_timeout)),
            upstreams: Arc::new(upstreams),
            speech: Arc::new(speech),
            chat_client: Arc::new(OpenAICompatibleChat::new(
                chat_config,
                config.chat_model.clone(),
            )),
            system_prompt: Arc::new(config.system_prompt.clone()),
        })
    }

    /// The connector that dials the upstream for `route`.
    pub fn upstream(&self, route: StreamRoute) -> Option<Arc<dyn UpstreamConnector>> {
        self.upstreams.get(&route).cloned()
    }
}
