//! Doubao (Volcengine ARK) multimodal embedding client

use super::cache::{embedding_cache_key, EmbeddingCache};
use super::Embedder;
use crate::error::{RagRouteError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Vector size produced by the Doubao vision embedding models
pub const DOUBAO_DIMENSIONS: usize = 2048;

/// Embedder for the ARK `/embeddings/multimodal` endpoint
///
/// The endpoint embeds one input at a time, so documents are sent one by one.
/// A document that fails to embed becomes a zero vector and the batch goes on.
pub struct DoubaoEmbedder {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    cache: EmbeddingCache,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MultimodalInput<'a> {
    Text { text: &'a str },
}

impl DoubaoEmbedder {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagRouteError::Config(
                "ARK_API_KEY is required for Doubao embeddings".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(RagRouteError::Http)?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/embeddings/multimodal", normalize_base_url(base_url)),
            api_key,
            model: model.into(),
            cache: EmbeddingCache::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            encoding_format: &'static str,
            input: Vec<MultimodalInput<'a>>,
        }

        #[derive(Deserialize)]
        struct Response {
            data: ResponseData,
        }

        #[derive(Deserialize)]
        struct ResponseData {
            embedding: Vec<f32>,
        }

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&Request {
                model: &self.model,
                encoding_format: "float",
                input: vec![MultimodalInput::Text { text }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RagRouteError::from_response("Doubao embedding", response).await);
        }

        let body: serde_json::Value = response.json().await?;
        let parsed: Response = serde_json::from_value(body.clone()).map_err(|_| {
            RagRouteError::Embedding(format!("missing data.embedding in response: {}", body))
        })?;

        Ok(parsed.data.embedding)
    }
}

/// Prefix `https://` when the configured base URL has no scheme
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[async_trait]
impl Embedder for DoubaoEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let key = embedding_cache_key(&self.model, text);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }
        let embedding = self.embed_one(text).await?;
        self.cache.set(key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            tracing::debug!("Embedding document {}/{}", i + 1, texts.len());
            match self.embed_one(text).await {
                Ok(embedding) => embeddings.push(embedding),
                Err(e) => {
                    tracing::warn!("Document {} embedding failed, using zero vector: {}", i + 1, e);
                    embeddings.push(vec![0.0; DOUBAO_DIMENSIONS]);
                }
            }
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        DOUBAO_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_normalization() {
        assert_eq!(
            normalize_base_url("ark.cn-beijing.volces.com/api/v3"),
            "https://ark.cn-beijing.volces.com/api/v3"
        );
        assert_eq!(normalize_base_url("http://localhost:9000/"), "http://localhost:9000");
    }

    #[test]
    fn test_endpoint_path() {
        let embedder = DoubaoEmbedder::new("ark.example.com/api/v3", "key", "m", 5).unwrap();
        assert_eq!(
            embedder.endpoint(),
            "https://ark.example.com/api/v3/embeddings/multimodal"
        );
        assert!(DoubaoEmbedder::new("ark.example.com", "  ", "m", 5).is_err());
    }

    #[tokio::test]
    async fn test_text_input_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings/multimodal"))
            .and(body_partial_json(json!({
                "encoding_format": "float",
                "input": [{"type": "text", "text": "hello"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"embedding": [0.25, 0.75]}})),
            )
            .mount(&server)
            .await;

        let embedder = DoubaoEmbedder::new(&server.uri(), "key", "m", 5).unwrap();
        assert_eq!(embedder.embed_query("hello").await.unwrap(), vec![0.25, 0.75]);
    }

    #[tokio::test]
    async fn test_failed_document_becomes_zero_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings/multimodal"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let embedder = DoubaoEmbedder::new(&server.uri(), "key", "m", 5).unwrap();
        let vectors = embedder
            .embed_documents(&["doc".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), DOUBAO_DIMENSIONS);
        assert!(vectors[0].iter().all(|v| *v == 0.0));

        assert!(embedder.embed_query("question").await.is_err());
    }
}
