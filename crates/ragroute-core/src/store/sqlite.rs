//! Local vector store backed by a single SQLite file
//!
//! Stores embeddings as BLOBs and computes cosine similarity in Rust.

use super::{Document, Metadata, ScoredDocument, VectorStore};
use crate::collections::CollectionKey;
use crate::error::{RagRouteError, Result};
use crate::llm::Embedder;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex};

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    collection TEXT NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL,
    embedding BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
"#;

/// SQLite-backed [`VectorStore`]
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorStore {
    /// Open (or create) a store file
    pub fn open(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::with_connection(Connection::open(path)?, embedder)
    }

    /// In-memory store, mostly for tests
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, embedder)
    }

    fn with_connection(conn: Connection, embedder: Arc<dyn Embedder>) -> Result<Self> {
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RagRouteError::VectorStore("connection lock poisoned".to_string()))
    }

    /// Number of stored chunks in a collection
    pub fn count(&self, collection: CollectionKey) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection.collection_name()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn insert(
        &self,
        collection: CollectionKey,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let name = collection.collection_name();

        let tx = conn.transaction()?;
        for (doc, embedding) in documents.iter().zip(embeddings) {
            tx.execute(
                "INSERT OR REPLACE INTO documents (id, collection, content, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    document_id(name, &doc.content),
                    name,
                    doc.content,
                    serde_json::to_string(&doc.metadata)?,
                    embedding_to_bytes(embedding),
                    now
                ],
            )?;
        }
        tx.commit()?;

        Ok(documents.len())
    }

    fn rank(
        &self,
        collection: CollectionKey,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT content, metadata, embedding FROM documents WHERE collection = ?1")?;

        let rows = stmt
            .query_map(params![collection.collection_name()], |row| {
                let content: String = row.get(0)?;
                let metadata: String = row.get(1)?;
                let embedding_bytes: Vec<u8> = row.get(2)?;
                Ok((content, metadata, embedding_bytes))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut scored = Vec::with_capacity(rows.len());
        for (content, metadata, bytes) in rows {
            let metadata: Metadata = serde_json::from_str(&metadata)?;
            let score = cosine_similarity(query_embedding, &bytes_to_embedding(&bytes));
            scored.push(ScoredDocument::new(Document { content, metadata }, score));
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn add_documents(
        &self,
        collection: CollectionKey,
        documents: &[Document],
    ) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        if embeddings.len() != documents.len() {
            return Err(RagRouteError::Embedding(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }
        self.insert(collection, documents, &embeddings)
    }

    async fn similarity_search_with_score(
        &self,
        collection: CollectionKey,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let query_embedding = self.embedder.embed_query(query).await?;
        self.rank(collection, &query_embedding, k)
    }

    fn backend_name(&self) -> &str {
        "sqlite"
    }
}

/// Content-addressed row id, so re-ingesting a chunk replaces it
fn document_id(collection_name: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(collection_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Convert f32 embedding to bytes (little-endian)
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps a handful of words onto fixed axes
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            Ok(vec![
                text.contains("price") as i32 as f32,
                text.contains("refund") as i32 as f32,
                text.contains("battery") as i32 as f32,
            ])
        }

        async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed_query(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "keyword"
        }
    }

    #[test]
    fn test_embedding_roundtrip() {
        let original = vec![1.0f32, 2.0, 3.0, -1.5];
        let bytes = embedding_to_bytes(&original);
        assert_eq!(bytes_to_embedding(&bytes), original);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-4);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-4);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_add_and_search_within_collection() {
        let store = SqliteVectorStore::in_memory(Arc::new(KeywordEmbedder)).unwrap();
        let written = store
            .add_documents(
                CollectionKey::Support,
                &[
                    Document::new("Refund requests are handled within 5 days")
                        .with_metadata("filename", "faq.md"),
                    Document::new("Battery replacement guide"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(written, 2);
        store
            .add_documents(CollectionKey::Finance, &[Document::new("Price list 2024")])
            .await
            .unwrap();

        let hits = store
            .similarity_search_with_score(CollectionKey::Support, "refund status", 4)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].document.content.starts_with("Refund"));
        assert_eq!(hits[0].document.metadata["filename"], "faq.md");
        assert!(hits[0].score > hits[1].score);

        let empty = store
            .similarity_search_with_score(CollectionKey::Products, "refund", 4)
            .await
            .unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.sqlite");
        let store = SqliteVectorStore::open(&path, Arc::new(KeywordEmbedder)).unwrap();

        let docs = vec![Document::new("Price of the premium plan")];
        store.add_documents(CollectionKey::Finance, &docs).await.unwrap();
        store.add_documents(CollectionKey::Finance, &docs).await.unwrap();

        assert_eq!(store.count(CollectionKey::Finance).unwrap(), 1);
        assert!(path.exists());
    }
}
