//! Ragroute Core Library
//!
//! Routes questions to topical document collections and answers them with
//! retrieval-augmented generation.
//!
//! # Features
//! - Hybrid routing: mean vector similarity per collection, chat-model
//!   classification when confidence is low
//! - Context-grounded answers from the routed collection
//! - Fallback chain: web search, then general knowledge, then an apology
//! - Qdrant (gRPC client, `vector-qdrant` feature) or local SQLite vector storage
//! - OpenAI-compatible chat and embeddings, Doubao multimodal embeddings

pub mod agents;
pub mod collections;
pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod prompts;
pub mod store;
pub mod tools;
pub mod workflow;

pub use agents::{
    AnswerSource, DetailedAnswer, QaAgent, QaResult, QueryRouter, QuestionAnswerer, RoutingAgent,
    RoutingDecision, RoutingMethod, SourcePreview,
};
pub use collections::{CollectionDescriptor, CollectionKey, COLLECTIONS};
pub use config::Config;
pub use error::{Error, RagRouteError, Result};
pub use index::{DocumentProcessor, IngestSource, TextSplitter};
pub use llm::{ChatMessage, DoubaoEmbedder, Embedder, LLMClient, OpenAIChatClient, OpenAIEmbedder};
#[cfg(feature = "vector-qdrant")]
pub use store::QdrantStore;
pub use store::{Document, ScoredDocument, SqliteVectorStore, VectorStore};
pub use tools::{DuckDuckGoSearch, TavilySearch, WebSearch};
pub use workflow::{IngestReport, Node, RagWorkflow, WorkflowOutcome, WorkflowState};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "ragroute";
