//! Question workflow: route, then answer or recover
//!
//! ```text
//! route_query ──ok──▶ answer_question ──▶ end
//!      └──error──▶ handle_error ──▶ end
//! ```
//!
//! A run owns its [`WorkflowState`]; nodes execute in order with no retries.

use crate::agents::{
    AnswerSource, QaAgent, QueryRouter, QuestionAnswerer, RoutingAgent, RoutingDecision,
};
use crate::collections::CollectionKey;
use crate::config::Config;
use crate::error::{RagRouteError, Result};
use crate::index::{collect_files, DocumentProcessor, IngestSource};
use crate::llm::{chat_client_from_config, embedder_from_config};
use crate::store::{open_store, Document, ScoredDocument, VectorStore};
use crate::tools::web_search_from_config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Graph nodes, recorded in the run trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    RouteQuery,
    AnswerQuestion,
    HandleError,
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::RouteQuery => "route_query",
            Self::AnswerQuestion => "answer_question",
            Self::HandleError => "handle_error",
        })
    }
}

/// Mutable state threaded through one run
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub question: String,
    pub collection: Option<CollectionKey>,
    pub answer: String,
    pub answer_source: Option<AnswerSource>,
    pub documents: Vec<ScoredDocument>,
    pub routing: Option<RoutingDecision>,
    pub error: Option<String>,
    pub trace: Vec<Node>,
}

impl WorkflowState {
    fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
            ..Default::default()
        }
    }
}

/// Result of [`RagWorkflow::process_question`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub question: String,
    pub answer: String,
    pub collection: Option<CollectionKey>,
    pub answer_source: Option<AnswerSource>,
    pub num_documents: usize,
    pub documents: Vec<ScoredDocument>,
    pub routing: Option<RoutingDecision>,
    pub success: bool,
    pub error: Option<String>,
    pub trace: Vec<Node>,
}

impl From<WorkflowState> for WorkflowOutcome {
    fn from(state: WorkflowState) -> Self {
        Self {
            question: state.question,
            answer: state.answer,
            collection: state.collection,
            answer_source: state.answer_source,
            num_documents: state.documents.len(),
            documents: state.documents,
            routing: state.routing,
            success: state.error.is_none(),
            error: state.error,
            trace: state.trace,
        }
    }
}

/// Summary of an ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub collection: CollectionKey,
    pub processed_files: Vec<String>,
    pub num_chunks: usize,
}

impl IngestReport {
    pub fn message(&self) -> String {
        format!(
            "Processed {} files and added {} chunks to the {} collection.",
            self.processed_files.len(),
            self.num_chunks,
            self.collection
        )
    }
}

/// Routes questions and answers them, absorbing failures along the way
pub struct RagWorkflow {
    router: Arc<dyn QueryRouter>,
    answerer: Arc<dyn QuestionAnswerer>,
    store: Arc<dyn VectorStore>,
    processor: DocumentProcessor,
}

impl RagWorkflow {
    pub fn new(
        router: Arc<dyn QueryRouter>,
        answerer: Arc<dyn QuestionAnswerer>,
        store: Arc<dyn VectorStore>,
        processor: DocumentProcessor,
    ) -> Self {
        Self {
            router,
            answerer,
            store,
            processor,
        }
    }

    /// Build every adapter from validated configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let llm = chat_client_from_config(config)?;
        let embedder = embedder_from_config(config)?;
        let store = open_store(config, embedder).await?;
        let web_search = web_search_from_config(config)?;

        let router = RoutingAgent::new(
            Arc::clone(&store),
            Arc::clone(&llm),
            config.routing.similarity_threshold,
        );
        let answerer = QaAgent::new(Arc::clone(&store), llm, web_search);

        Ok(Self::new(
            Arc::new(router),
            Arc::new(answerer),
            store,
            DocumentProcessor::from_config(config)?,
        ))
    }

    /// Routing decision alone
    pub async fn route(&self, question: &str) -> Result<RoutingDecision> {
        self.router.decide(question).await
    }

    /// Run the graph to completion
    pub async fn run(&self, question: &str) -> WorkflowState {
        let mut state = WorkflowState::new(question);

        self.route_query(&mut state).await;
        if state.error.is_some() {
            self.handle_error(&mut state).await;
        } else {
            self.answer_question(&mut state).await;
        }

        tracing::debug!(
            "Workflow trace: {}",
            state
                .trace
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        state
    }

    pub async fn process_question(&self, question: &str) -> WorkflowOutcome {
        self.run(question).await.into()
    }

    async fn route_query(&self, state: &mut WorkflowState) {
        state.trace.push(Node::RouteQuery);
        match self.router.decide(&state.question).await {
            Ok(decision) => {
                tracing::info!(
                    "Routed to {} via {}",
                    decision
                        .collection
                        .map(|k| k.as_str())
                        .unwrap_or("web search"),
                    decision.method
                );
                state.collection = decision.collection;
                state.routing = Some(decision);
                state.error = None;
            }
            Err(e) => {
                tracing::warn!("Routing failed: {}", e);
                state.collection = None;
                state.routing = None;
                state.error = Some(format!("Routing error: {}", e));
            }
        }
    }

    async fn answer_question(&self, state: &mut WorkflowState) {
        state.trace.push(Node::AnswerQuestion);
        match self.answerer.answer(&state.question, state.collection).await {
            Ok(result) => {
                state.answer = result.answer;
                state.answer_source = Some(result.source);
                state.documents = result.documents;
                state.error = None;
            }
            Err(e) => {
                tracing::warn!("Answering failed: {}", e);
                state.answer = format!("Sorry, I encountered an error while answering: {}", e);
                state.answer_source = None;
                state.documents = Vec::new();
                state.error = Some(format!("QA error: {}", e));
            }
        }
    }

    async fn handle_error(&self, state: &mut WorkflowState) {
        state.trace.push(Node::HandleError);
        match self.answerer.answer_from_web_search(&state.question).await {
            Ok(result) => {
                state.answer = result.answer;
                state.answer_source = Some(result.source);
                state.documents = result.documents;
            }
            Err(e) => {
                tracing::warn!("Error recovery failed: {}", e);
                state.answer = format!("Sorry, all fallback methods failed. Error: {}", e);
                state.answer_source = None;
                state.documents = Vec::new();
            }
        }
    }

    /// Chunk every source and upsert all chunks into one collection
    pub async fn add_documents(
        &self,
        collection: CollectionKey,
        sources: &[IngestSource],
    ) -> Result<IngestReport> {
        let mut documents: Vec<Document> = Vec::new();
        let mut processed_files: Vec<String> = Vec::new();

        for source in sources {
            match source {
                IngestSource::Text { name, content } => {
                    documents.extend(self.processor.process_text(name, content));
                    processed_files.push(name.clone());
                }
                IngestSource::Path(path) => {
                    let files = collect_files(path)
                        .map_err(|e| ingest_error(&source.display_name(), &e, &processed_files))?;
                    for file in files {
                        let name = file.display().to_string();
                        let chunks = self
                            .processor
                            .process_file(&file)
                            .map_err(|e| ingest_error(&name, &e, &processed_files))?;
                        documents.extend(chunks);
                        processed_files.push(name);
                    }
                }
            }
        }

        if documents.is_empty() {
            return Err(RagRouteError::Document(
                "No documents were extracted from the given sources.".to_string(),
            ));
        }

        let num_chunks = self.store.add_documents(collection, &documents).await?;
        let report = IngestReport {
            collection,
            processed_files,
            num_chunks,
        };
        tracing::info!("{}", report.message());
        Ok(report)
    }
}

fn ingest_error(name: &str, error: &RagRouteError, processed: &[String]) -> RagRouteError {
    let processed = if processed.is_empty() {
        "none".to_string()
    } else {
        processed.join(", ")
    };
    RagRouteError::Document(format!(
        "Error processing file {}: {} (processed so far: {})",
        name, error, processed
    ))
}
