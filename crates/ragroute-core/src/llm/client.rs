//! HTTP client for OpenAI-compatible chat completion services

use crate::config::Config;
use crate::error::{RagRouteError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for chat model clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Single-prompt convenience wrapper
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.chat_completion(vec![ChatMessage::user(prompt)]).await
    }

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-compatible client (OpenAI, OpenRouter, vLLM, ...)
pub struct OpenAIChatClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAIChatClient {
    /// Create a client for the given endpoint
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(RagRouteError::Http)?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.0,
        })
    }

    /// Create from configuration; fails when no API key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            RagRouteError::Config("OpenAI API key is not configured; set OPENAI_API_KEY".into())
        })?;
        let mut client = Self::new(
            &config.chat.base_url,
            api_key,
            &config.chat.model,
            config.timeout_secs,
        )?;
        client.temperature = config.chat.temperature;

        tracing::info!("Using chat model {} at {}", client.model, client.base_url);
        Ok(client)
    }
}

#[async_trait]
impl LLMClient for OpenAIChatClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            #[serde(default)]
            content: Option<String>,
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagRouteError::from_response("LLM service", response).await);
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| RagRouteError::Llm("No response from LLM".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
