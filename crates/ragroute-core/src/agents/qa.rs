//! Question answering over a collection, with web and general-knowledge fallbacks

use super::QuestionAnswerer;
use crate::collections::CollectionKey;
use crate::config::Config;
use crate::error::Result;
use crate::llm::{chat_client_from_config, embedder_from_config, LLMClient};
use crate::prompts::{
    general_knowledge_prompt, qa_messages, GENERAL_KNOWLEDGE_LABEL, WEB_SEARCH_LABEL,
};
use crate::store::{open_store, Metadata, ScoredDocument, VectorStore};
use crate::tools::{web_search_from_config, WebSearch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Documents retrieved to ground an answer
pub const QA_TOP_K: usize = 4;

/// Source previews returned by [`QaAgent::detailed_answer`]
pub const MAX_SOURCE_PREVIEWS: usize = 3;

/// Characters kept in a source preview
pub const PREVIEW_CHARS: usize = 200;

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Collection,
    WebSearch,
    GeneralKnowledge,
    Unavailable,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::WebSearch => "web_search",
            Self::GeneralKnowledge => "general_knowledge",
            Self::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An answer with the documents it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResult {
    pub answer: String,
    pub documents: Vec<ScoredDocument>,
    pub source: AnswerSource,
    /// Last failure seen on the way to this answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QaResult {
    pub fn success(&self) -> bool {
        self.source != AnswerSource::Unavailable
    }
}

/// Preview of one source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePreview {
    pub index: usize,
    pub content_preview: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Answer plus metadata for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnswer {
    pub question: String,
    pub answer: String,
    pub collection: Option<CollectionKey>,
    pub source: AnswerSource,
    pub num_sources: usize,
    pub sources: Vec<SourcePreview>,
}

/// Answers questions from a collection, degrading to web search and then
/// to the chat model's own knowledge
pub struct QaAgent {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LLMClient>,
    web_search: Arc<dyn WebSearch>,
    top_k: usize,
}

impl QaAgent {
    pub fn new(
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LLMClient>,
        web_search: Arc<dyn WebSearch>,
    ) -> Self {
        Self {
            store,
            llm,
            web_search,
            top_k: QA_TOP_K,
        }
    }

    /// Build the agent and its adapters from validated configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let llm = chat_client_from_config(config)?;
        let store = open_store(config, embedder_from_config(config)?).await?;
        Ok(Self::new(store, llm, web_search_from_config(config)?))
    }

    /// Answer a question; never fails
    pub async fn answer(&self, question: &str, collection: Option<CollectionKey>) -> QaResult {
        match collection {
            Some(key) => self.answer_from_collection(question, key).await,
            None => self.answer_from_web_search(question).await,
        }
    }

    async fn answer_from_collection(&self, question: &str, key: CollectionKey) -> QaResult {
        let documents = match self
            .store
            .similarity_search_with_score(key, question, self.top_k)
            .await
        {
            Ok(docs) if docs.is_empty() => {
                tracing::warn!("No documents found in {}, trying web search", key);
                return self.answer_from_web_search(question).await;
            }
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!("Retrieval from {} failed: {}. Trying web search", key, e);
                return self.answer_from_web_search(question).await;
            }
        };

        match self.llm.chat_completion(qa_messages(question, &documents)).await {
            Ok(answer) if !answer.trim().is_empty() => QaResult {
                answer,
                documents,
                source: AnswerSource::Collection,
                error: None,
            },
            Ok(_) => {
                tracing::warn!("Empty answer from chat model, trying web search");
                self.answer_from_web_search(question).await
            }
            Err(e) => {
                tracing::warn!("Answer generation failed: {}. Trying web search", e);
                self.answer_from_web_search(question).await
            }
        }
    }

    /// Web search, then general knowledge, then an apology
    pub async fn answer_from_web_search(&self, question: &str) -> QaResult {
        let search_error = match self.web_search.search(question).await {
            Ok(results) => {
                return QaResult {
                    answer: format!("{}\n\n{}", WEB_SEARCH_LABEL, results),
                    documents: Vec::new(),
                    source: AnswerSource::WebSearch,
                    error: None,
                }
            }
            Err(e) => e,
        };
        tracing::warn!(
            "Web search via {} failed: {}. Answering from general knowledge",
            self.web_search.provider_name(),
            search_error
        );

        match self.llm.invoke(&general_knowledge_prompt(question)).await {
            Ok(answer) if !answer.trim().is_empty() => QaResult {
                answer: format!("{}\n\n{}", GENERAL_KNOWLEDGE_LABEL, answer),
                documents: Vec::new(),
                source: AnswerSource::GeneralKnowledge,
                error: Some(search_error.to_string()),
            },
            Ok(_) => unavailable("empty answer from chat model".to_string()),
            Err(e) => unavailable(e.to_string()),
        }
    }

    /// Answer with up to three source previews
    pub async fn detailed_answer(
        &self,
        question: &str,
        collection: Option<CollectionKey>,
        include_sources: bool,
    ) -> DetailedAnswer {
        let result = self.answer(question, collection).await;
        let sources = if include_sources {
            source_previews(&result.documents)
        } else {
            Vec::new()
        };

        DetailedAnswer {
            question: question.to_string(),
            answer: result.answer,
            collection,
            source: result.source,
            num_sources: result.documents.len(),
            sources,
        }
    }
}

fn unavailable(error: String) -> QaResult {
    tracing::warn!("All answer fallbacks failed: {}", error);
    QaResult {
        answer: format!(
            "Sorry, I could not answer your question due to a technical problem. Error: {}",
            error
        ),
        documents: Vec::new(),
        source: AnswerSource::Unavailable,
        error: Some(error),
    }
}

/// Previews of the top documents: 1-based index and the first 200 characters
pub fn source_previews(documents: &[ScoredDocument]) -> Vec<SourcePreview> {
    documents
        .iter()
        .take(MAX_SOURCE_PREVIEWS)
        .enumerate()
        .map(|(i, doc)| SourcePreview {
            index: i + 1,
            content_preview: preview(&doc.document.content),
            score: doc.score,
            metadata: doc.document.metadata.clone(),
        })
        .collect()
}

fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}

#[async_trait]
impl QuestionAnswerer for QaAgent {
    async fn answer(
        &self,
        question: &str,
        collection: Option<CollectionKey>,
    ) -> Result<QaResult> {
        Ok(QaAgent::answer(self, question, collection).await)
    }

    async fn answer_from_web_search(&self, question: &str) -> Result<QaResult> {
        Ok(QaAgent::answer_from_web_search(self, question).await)
    }
}
