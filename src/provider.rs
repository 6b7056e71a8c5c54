//! Embedding and completion provider
//!
//! The index and query paths talk to the provider through the [`Provider`]
//! trait so tests can substitute a deterministic fake. The production
//! implementation calls the OpenAI API (or any compatible endpoint via
//! `OPENAI_API_BASE`).

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
};
use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Result, ServerError};

/// External embedding/completion capability
#[async_trait]
pub trait Provider: Send + Sync {
    /// Produce an embedding vector for one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Produce an answer from a system prompt and a user prompt
    async fn answer(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-backed provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    embedding_model: String,
    llm_model: String,
}

impl OpenAiProvider {
    /// Build a provider from the server configuration
    ///
    /// Credentials are taken from `OPENAI_API_KEY`; `Config::from_env`
    /// already guarantees it is present.
    pub fn new(config: &Config) -> Self {
        let client = match &config.api_base {
            Some(base) => {
                Client::with_config(OpenAIConfig::new().with_api_base(base.clone()))
            }
            None => Client::new(),
        };

        Self {
            client,
            embedding_model: config.embedding_model.clone(),
            llm_model: config.llm_model.clone(),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(text.to_string())
            .build()?;

        let response = self.client.embeddings().create(request).await?;
        let data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ServerError::Provider("empty embedding response".to_string()))?;

        Ok(data.embedding)
    }

    async fn answer(&self, system: &str, user: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.llm_model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServerError::Provider("empty completion response".to_string()))
    }
}
