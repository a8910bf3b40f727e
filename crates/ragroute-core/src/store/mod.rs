//! Vector store adapters
//!
//! Collections live in an external vector database. The adapters take care
//! of embedding text through an [`Embedder`] and of mapping collection keys to
//! backing collection names; storage and indexing belong to the backend.

#[cfg(feature = "vector-qdrant")]
mod qdrant;
mod sqlite;

#[cfg(feature = "vector-qdrant")]
pub use qdrant::{point_id, QdrantStore, UPSERT_BATCH_SIZE};
pub use sqlite::{bytes_to_embedding, cosine_similarity, embedding_to_bytes, SqliteVectorStore};

use crate::collections::CollectionKey;
use crate::config::{Config, VectorBackend};
use crate::error::Result;
use crate::llm::Embedder;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Free-form document metadata
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A piece of text stored in a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// A retrieved document with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub document: Document,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Document, score: f32) -> Self {
        Self { document, score }
    }
}

/// Operations the routing system needs from a vector database
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and upsert documents, returning how many were written
    async fn add_documents(&self, collection: CollectionKey, documents: &[Document])
        -> Result<usize>;

    /// Top-k documents for a query, best first
    async fn similarity_search_with_score(
        &self,
        collection: CollectionKey,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>>;

    /// Search every collection; a failing collection yields an empty list
    async fn search_all_collections(
        &self,
        query: &str,
        k: usize,
    ) -> BTreeMap<CollectionKey, Vec<ScoredDocument>> {
        let mut results = BTreeMap::new();
        for key in CollectionKey::ALL {
            let hits = match self.similarity_search_with_score(key, query, k).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!("Error searching {}: {}", key, e);
                    Vec::new()
                }
            };
            results.insert(key, hits);
        }
        results
    }

    /// Short backend name for diagnostics
    fn backend_name(&self) -> &str;
}

/// Open the backend selected by the configuration, creating missing collections
pub async fn open_store(
    config: &Config,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn VectorStore>> {
    let dimensions = embedder.dimensions();
    let store: Arc<dyn VectorStore> = match config.vector_store.backend()? {
        VectorBackend::Qdrant { url, api_key } => {
            connect_qdrant(&url, &api_key, embedder, dimensions, config.timeout_secs).await?
        }
        VectorBackend::Sqlite { path } => {
            tracing::debug!("Opening local vector store at {}", path.display());
            Arc::new(SqliteVectorStore::open(&path, embedder)?)
        }
    };

    tracing::info!(
        "Using {} vector store ({} dimensions)",
        store.backend_name(),
        dimensions
    );
    Ok(store)
}

#[cfg(feature = "vector-qdrant")]
async fn connect_qdrant(
    url: &str,
    api_key: &str,
    embedder: Arc<dyn Embedder>,
    dimensions: usize,
    timeout_secs: u64,
) -> Result<Arc<dyn VectorStore>> {
    tracing::debug!("Connecting to Qdrant at {}", url);
    let store = QdrantStore::connect(url, api_key, embedder, dimensions, timeout_secs).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "vector-qdrant"))]
async fn connect_qdrant(
    _url: &str,
    _api_key: &str,
    _embedder: Arc<dyn Embedder>,
    _dimensions: usize,
    _timeout_secs: u64,
) -> Result<Arc<dyn VectorStore>> {
    Err(crate::error::RagRouteError::Config(
        "Qdrant is configured but this build lacks the `vector-qdrant` feature; \
         use RAGROUTE_SQLITE_PATH or rebuild with the feature"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RagRouteError;
    use std::sync::Mutex;

    struct FlakyStore {
        calls: Mutex<Vec<CollectionKey>>,
    }

    #[async_trait]
    impl VectorStore for FlakyStore {
        async fn add_documents(&self, _: CollectionKey, documents: &[Document]) -> Result<usize> {
            Ok(documents.len())
        }

        async fn similarity_search_with_score(
            &self,
            collection: CollectionKey,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<ScoredDocument>> {
            self.calls.lock().unwrap().push(collection);
            match collection {
                CollectionKey::Support => Err(RagRouteError::VectorStore("offline".into())),
                _ => Ok(vec![ScoredDocument::new(Document::new("hit"), 0.4)]),
            }
        }

        fn backend_name(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_search_all_absorbs_failures() {
        let store = FlakyStore {
            calls: Mutex::new(Vec::new()),
        };
        let results = store.search_all_collections("q", 3).await;

        assert_eq!(results.len(), 3);
        assert!(results[&CollectionKey::Support].is_empty());
        assert_eq!(results[&CollectionKey::Finance].len(), 1);
        assert_eq!(store.calls.lock().unwrap().len(), 3);
    }

    struct ZeroEmbedder;

    #[async_trait]
    impl Embedder for ZeroEmbedder {
        async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 3])
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "zero"
        }
    }

    #[tokio::test]
    async fn test_open_store_uses_sqlite_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.vector_store.sqlite_path = Some(dir.path().join("store.sqlite"));

        let store = open_store(&config, Arc::new(ZeroEmbedder)).await.unwrap();
        assert_eq!(store.backend_name(), "sqlite");
        assert!(dir.path().join("store.sqlite").exists());
    }

    #[tokio::test]
    async fn test_open_store_without_backend_fails() {
        let result = open_store(&Config::default(), Arc::new(ZeroEmbedder)).await;
        assert!(matches!(result, Err(RagRouteError::Config(_))));
    }

    #[test]
    fn test_scored_document_serializes_flat() {
        let doc = ScoredDocument::new(Document::new("text").with_metadata("filename", "a.md"), 0.5);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["content"], "text");
        assert_eq!(json["metadata"]["filename"], "a.md");
        assert_eq!(json["score"], 0.5);
    }
}
