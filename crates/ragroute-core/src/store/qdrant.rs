//! Qdrant adapter over the official gRPC client

use super::{Document, Metadata, ScoredDocument, VectorStore};
use crate::collections::CollectionKey;
use crate::error::{RagRouteError, Result};
use crate::llm::Embedder;
use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, ListValue, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Points sent per upsert request
pub const UPSERT_BATCH_SIZE: usize = 64;

const CONTENT_KEY: &str = "page_content";
const METADATA_KEY: &str = "metadata";

/// Convert Qdrant errors to vector store errors
fn map_qdrant_error(error: QdrantError) -> RagRouteError {
    match error {
        QdrantError::ResponseError { status, .. } => RagRouteError::VectorStore(format!(
            "Qdrant request failed ({:?}): {}",
            status.code(),
            status.message()
        )),
        other => RagRouteError::VectorStore(format!("Qdrant error: {}", other)),
    }
}

/// Vector store backed by a Qdrant server
pub struct QdrantStore {
    client: Qdrant,
    embedder: Arc<dyn Embedder>,
}

impl QdrantStore {
    /// Connect and make sure every collection exists with the embedder's vector size
    pub async fn connect(
        url: &str,
        api_key: &str,
        embedder: Arc<dyn Embedder>,
        vector_size: usize,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .api_key(api_key.to_string())
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(map_qdrant_error)?;

        let store = Self { client, embedder };
        store.ensure_collections(vector_size).await?;
        Ok(store)
    }

    async fn ensure_collections(&self, vector_size: usize) -> Result<()> {
        let existing = self
            .client
            .list_collections()
            .await
            .map_err(map_qdrant_error)?;

        for key in CollectionKey::ALL {
            let name = key.collection_name();
            if existing.collections.iter().any(|c| c.name == name) {
                continue;
            }
            tracing::info!("Creating Qdrant collection {} (size {})", name, vector_size);
            self.client
                .create_collection(CreateCollectionBuilder::new(name).vectors_config(
                    VectorParamsBuilder::new(vector_size as u64, Distance::Cosine),
                ))
                .await
                .map_err(map_qdrant_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn add_documents(
        &self,
        collection: CollectionKey,
        documents: &[Document],
    ) -> Result<usize> {
        let name = collection.collection_name();
        let mut written = 0;

        for batch in documents.chunks(UPSERT_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embeddings = self.embedder.embed_documents(&texts).await?;
            let points = build_points(name, batch, embeddings)?;

            self.client
                .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
                .await
                .map_err(|e| {
                    let err = map_qdrant_error(e);
                    tracing::warn!(
                        "Upsert into {} stopped after {} of {} points: {}",
                        name,
                        written,
                        documents.len(),
                        err
                    );
                    err
                })?;

            written += batch.len();
            tracing::debug!("Upserted {}/{} points into {}", written, documents.len(), name);
        }

        Ok(written)
    }

    async fn similarity_search_with_score(
        &self,
        collection: CollectionKey,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let vector = self.embedder.embed_query(query).await?;
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection.collection_name(), vector, k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(map_qdrant_error)?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredDocument::new(document_from_payload(point.payload), point.score))
            .collect())
    }

    fn backend_name(&self) -> &str {
        "qdrant"
    }
}

/// Deterministic point id derived from collection and content
pub fn point_id(collection_name: &str, content: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(collection_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn build_points(
    collection_name: &str,
    documents: &[Document],
    embeddings: Vec<Vec<f32>>,
) -> Result<Vec<PointStruct>> {
    if embeddings.len() != documents.len() {
        return Err(RagRouteError::Embedding(format!(
            "expected {} embeddings, got {}",
            documents.len(),
            embeddings.len()
        )));
    }

    Ok(documents
        .iter()
        .zip(embeddings)
        .map(|(doc, vector)| {
            PointStruct::new(
                point_id(collection_name, &doc.content),
                vector,
                document_payload(doc),
            )
        })
        .collect())
}

fn document_payload(document: &Document) -> HashMap<String, QdrantValue> {
    let mut payload = HashMap::new();
    payload.insert(
        CONTENT_KEY.to_string(),
        QdrantValue::from(document.content.clone()),
    );
    payload.insert(
        METADATA_KEY.to_string(),
        json_to_qdrant(serde_json::Value::Object(document.metadata.clone())),
    );
    payload
}

fn document_from_payload(mut payload: HashMap<String, QdrantValue>) -> Document {
    let content = match payload.remove(CONTENT_KEY).map(qdrant_to_json) {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    };
    let metadata = match payload.remove(METADATA_KEY).map(qdrant_to_json) {
        Some(serde_json::Value::Object(map)) => map,
        _ => Metadata::new(),
    };
    Document { content, metadata }
}

fn json_to_qdrant(value: serde_json::Value) -> QdrantValue {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant(v)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json(value: QdrantValue) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect(),
        ),
    }
}
