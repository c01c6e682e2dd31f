//! OpenAI-compatible HTTP client.

use crate::error::{LlmError, LlmResult};
use crate::prompt::{build_generation_prompt, SYSTEM_PROMPT};
use crate::types::*;
use async_trait::async_trait;
use murmur_config::LlmConfig;
use murmur_core::{Embedder, Generator};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Token cap for generated posts and replies; they are short by design.
const MAX_GENERATION_TOKENS: u32 = 500;

/// Client for an OpenAI-compatible embeddings + chat API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    timeout: Duration,
}

impl LlmClient {
    /// Create a new client from configuration. The API key is resolved
    /// from the configured environment variable.
    pub fn from_config(config: &LlmConfig) -> LlmResult<Self> {
        let api_key = config.api_key().unwrap_or_default();
        Self::new(
            config.base_url.as_str(),
            api_key,
            config.model.as_str(),
            config.embedding_model.as_str(),
            config.timeout_seconds,
        )
    }

    /// Create a new client with explicit settings.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
        timeout_seconds: u64,
    ) -> LlmResult<Self> {
        let timeout = Duration::from_secs(timeout_seconds);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Http)?;

        let base_url = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: embedding_model.into(),
            timeout,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_connect() {
            LlmError::Unreachable {
                base_url: self.base_url.clone(),
            }
        } else if e.is_timeout() {
            LlmError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            LlmError::Http(e)
        }
    }

    /// Generate an embedding vector for a piece of text.
    pub async fn embed_text(&self, text: &str) -> LlmResult<Vec<f32>> {
        // Newlines degrade embedding quality with these models
        let cleaned = text.replace('\n', " ").trim().to_string();
        if cleaned.is_empty() {
            return Err(LlmError::EmptyInput);
        }

        let url = format!("{}/embeddings", self.base_url);
        debug!(
            "Generating embedding with model {} for text length {}",
            self.embedding_model,
            cleaned.len()
        );

        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: vec![cleaned],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let embedding_response: EmbeddingResponse = response.json().await?;
        let embedding = embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(LlmError::EmptyResponse)?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    /// Run a chat completion and return the first choice's content.
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Generating with model {}", self.model);

        let request = ChatRequest::new(self.model.as_str(), messages)
            .with_max_tokens(MAX_GENERATION_TOKENS);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Embedder for LlmClient {
    async fn embed(&self, text: &str) -> murmur_core::Result<Vec<f32>> {
        self.embed_text(text)
            .await
            .map_err(|e| murmur_core::Error::EmbeddingUnavailable(e.to_string()))
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(
        &self,
        context_fragments: &[String],
        instruction: &str,
    ) -> murmur_core::Result<String> {
        let prompt = build_generation_prompt(context_fragments, instruction);
        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        self.chat(messages)
            .await
            .map_err(|e| murmur_core::Error::Generation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = LlmConfig::default();
        let client = LlmClient::from_config(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = LlmClient::new(
            "https://openrouter.ai/api/v1/",
            "key",
            "model",
            "embedding-model",
            30,
        )
        .unwrap();
        assert_eq!(client.base_url, "https://openrouter.ai/api/v1");
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_text() {
        let client = LlmClient::new("http://localhost:1", "key", "m", "e", 1).unwrap();
        let err = client.embed_text("  \n ").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyInput));
    }
}
