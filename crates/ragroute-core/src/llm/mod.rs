//! Model service integration
//!
//! Provides traits and implementations for:
//! - Chat completion via OpenAI-compatible services
//! - Embedding generation via OpenAI or Doubao (ARK)

mod cache;
mod client;
mod doubao;
mod openai_embedder;
mod traits;

pub use cache::{embedding_cache_key, EmbeddingCache};
pub use client::{ChatMessage, LLMClient, OpenAIChatClient};
pub use doubao::{normalize_base_url, DoubaoEmbedder, DOUBAO_DIMENSIONS};
pub use openai_embedder::OpenAIEmbedder;
pub use traits::*;

use crate::config::{Config, EmbeddingBackend};
use crate::error::Result;
use std::sync::Arc;

/// Build the chat client described by the configuration
pub fn chat_client_from_config(config: &Config) -> Result<Arc<dyn LLMClient>> {
    Ok(Arc::new(OpenAIChatClient::from_config(config)?))
}

/// Build the embedder described by the configuration (Doubao takes precedence)
pub fn embedder_from_config(config: &Config) -> Result<Arc<dyn Embedder>> {
    match config.embedding.backend() {
        EmbeddingBackend::Doubao {
            api_key,
            base_url,
            model,
        } => {
            tracing::info!("Using Doubao embedding model {} at {}", model, base_url);
            Ok(Arc::new(DoubaoEmbedder::new(
                &base_url,
                api_key,
                model,
                config.timeout_secs,
            )?))
        }
        EmbeddingBackend::OpenAI => Ok(Arc::new(OpenAIEmbedder::from_config(config)?)),
    }
}
