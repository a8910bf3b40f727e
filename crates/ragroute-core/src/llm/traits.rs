//! Embedding trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of documents, preserving order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}
