use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

/// Upper bound on reply length, in tokens.
pub const MAX_REPLY_TOKENS: u32 = 150;
pub const REPLY_TEMPERATURE: f32 = 0.7;

/// A synchronous chat-completion backend: one user message in, one reply out.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Asks the model to answer `message` under the given system prompt.
    async fn reply(&self, system_prompt: &str, message: &str) -> Result<String>;
}

/// A `ChatClient` for any OpenAI-compatible chat completions API.
pub struct OpenAICompatibleChat {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleChat {
    /// Creates a client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the service.
    /// * `model` - The model identifier used for every completion.
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAICompatibleChat {
    async fn reply(&self, system_prompt: &str, message: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(message)
                .build()?
                .into(),
        ];
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(MAX_REPLY_TOKENS)
            .temperature(REPLY_TEMPERATURE)
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Chat completion returned no text content")
    }
}
