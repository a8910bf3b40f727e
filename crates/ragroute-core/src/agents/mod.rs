//! Routing and question-answering agents
//!
//! The workflow talks to the agents through [`QueryRouter`] and
//! [`QuestionAnswerer`], so either side can be replaced.

mod qa;
mod routing;

pub use qa::*;
pub use routing::*;

use crate::collections::CollectionKey;
use crate::error::Result;
use async_trait::async_trait;

/// Chooses the collection that should answer a question
#[async_trait]
pub trait QueryRouter: Send + Sync {
    async fn decide(&self, question: &str) -> Result<RoutingDecision>;

    /// Collection key only; `None` means no collection fits
    async fn route(&self, question: &str) -> Result<Option<CollectionKey>> {
        Ok(self.decide(question).await?.collection)
    }
}

/// Produces answers for routed questions
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn answer(&self, question: &str, collection: Option<CollectionKey>)
        -> Result<QaResult>;

    async fn answer_from_web_search(&self, question: &str) -> Result<QaResult>;
}
