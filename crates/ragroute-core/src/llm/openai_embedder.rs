//! OpenAI-compatible embedding client

use super::cache::{embedding_cache_key, EmbeddingCache};
use super::Embedder;
use crate::config::Config;
use crate::error::{RagRouteError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Texts per request unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAIEmbedder {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    cache: EmbeddingCache,
}

impl OpenAIEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.to_lowercase().contains("openrouter") {
            return Err(RagRouteError::Config(
                "OpenRouter does not provide embeddings; configure Doubao (ARK_*) or a standard OpenAI endpoint"
                    .to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(RagRouteError::Http)?;

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
            batch_size: DEFAULT_BATCH_SIZE,
            cache: EmbeddingCache::new(),
        })
    }

    /// Texts per `/embeddings` request; zero keeps the default
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size > 0 {
            batch_size
        } else {
            DEFAULT_BATCH_SIZE
        };
        self
    }

    /// Create from configuration (shares the chat API key and base URL)
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            RagRouteError::Config("API key is not configured; set OPENAI_API_KEY or ARK_API_KEY".into())
        })?;
        tracing::info!("Using OpenAI embedding model {}", config.embedding.model);
        Ok(Self::new(
            &config.chat.base_url,
            api_key,
            &config.embedding.model,
            config.vector_store.vector_size,
            config.timeout_secs,
        )?
        .with_batch_size(config.embedding.batch_size))
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            embedding: Vec<f32>,
            #[serde(default)]
            index: usize,
        }

        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagRouteError::from_response("Embedding service", response).await);
        }

        let mut body: EmbedResponse = response.json().await?;
        if body.data.len() != input.len() {
            return Err(RagRouteError::Embedding(format!(
                "expected {} embeddings, got {}",
                input.len(),
                body.data.len()
            )));
        }
        body.data.sort_by_key(|d| d.index);

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let key = embedding_cache_key(&self.model, text);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Cache hit for query embedding");
            return Ok(cached);
        }

        let embedding = self
            .request(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagRouteError::Embedding("No embedding returned".to_string()))?;

        self.cache.set(key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let total = texts.len();
        let mut all_results = Vec::with_capacity(total);

        for (batch_idx, batch) in texts.chunks(self.batch_size).enumerate() {
            let results = self.request(batch).await.map_err(|e| {
                tracing::warn!(
                    "Embedding batch {} failed after {}/{} texts",
                    batch_idx + 1,
                    all_results.len(),
                    total
                );
                e
            })?;
            all_results.extend(results);
            tracing::debug!(
                "Embedded {}/{} documents with {}",
                all_results.len(),
                total,
                self.model
            );
        }

        Ok(all_results)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// Embeds each numeric input `n` as `[n]`, rejecting oversized requests
    struct NumberEmbeddings {
        max_inputs: usize,
    }

    impl Respond for NumberEmbeddings {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: serde_json::Value = match request.body_json() {
                Ok(body) => body,
                Err(_) => return ResponseTemplate::new(400),
            };
            let inputs = body["input"].as_array().cloned().unwrap_or_default();
            if inputs.len() > self.max_inputs {
                return ResponseTemplate::new(400).set_body_string(format!(
                    "'$.input' is invalid: array too long, max {}",
                    self.max_inputs
                ));
            }
            let data: Vec<_> = inputs
                .iter()
                .enumerate()
                .rev()
                .map(|(index, text)| {
                    let n: f32 = text.as_str().and_then(|t| t.parse().ok()).unwrap_or(-1.0);
                    json!({"index": index, "embedding": [n]})
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
        }
    }

    #[test]
    fn test_openrouter_is_rejected() {
        let result = OpenAIEmbedder::new(
            "https://openrouter.ai/api/v1",
            "key",
            "text-embedding-3-small",
            1536,
            5,
        );
        assert!(matches!(result, Err(RagRouteError::Config(_))));
    }

    #[tokio::test]
    async fn test_documents_are_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::new(server.uri(), "key", "m", 2, 5).unwrap();
        let vectors = embedder
            .embed_documents(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_documents_are_sent_in_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(NumberEmbeddings { max_inputs: 32 })
            .expect(3)
            .mount(&server)
            .await;

        let texts: Vec<String> = (0..70).map(|i| i.to_string()).collect();
        let embedder = OpenAIEmbedder::new(server.uri(), "key", "m", 1, 5)
            .unwrap()
            .with_batch_size(32);
        let vectors = embedder.embed_documents(&texts).await.unwrap();

        assert_eq!(vectors.len(), 70);
        for (i, vector) in vectors.iter().enumerate() {
            assert_eq!(vector, &vec![i as f32]);
        }
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected_by_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(NumberEmbeddings { max_inputs: 4 })
            .expect(1)
            .mount(&server)
            .await;

        let texts: Vec<String> = (0..6).map(|i| i.to_string()).collect();
        let embedder = OpenAIEmbedder::new(server.uri(), "key", "m", 1, 5)
            .unwrap()
            .with_batch_size(8);
        let err = embedder.embed_documents(&texts).await.unwrap_err();
        assert!(err.to_string().contains("array too long"));
    }

    #[test]
    fn test_zero_batch_size_keeps_default() {
        let embedder = OpenAIEmbedder::new("http://localhost", "key", "m", 1, 5)
            .unwrap()
            .with_batch_size(0);
        assert_eq!(embedder.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[tokio::test]
    async fn test_query_embedding_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [0.5, 0.5]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OpenAIEmbedder::new(server.uri(), "key", "m", 2, 5).unwrap();
        let first = embedder.embed_query("refund policy").await.unwrap();
        let second = embedder.embed_query("refund policy").await.unwrap();
        assert_eq!(first, second);
    }
}
