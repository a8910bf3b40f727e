//! Hybrid query routing: vector similarity first, chat-model classification second

use super::QueryRouter;
use crate::collections::CollectionKey;
use crate::error::{RagRouteError, Result};
use crate::llm::LLMClient;
use crate::prompts::{normalize_route_reply, routing_prompt};
use crate::store::VectorStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Documents retrieved per collection when scoring a question
pub const ROUTING_TOP_K: usize = 3;

/// How a routing decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMethod {
    VectorSimilarity,
    LlmFallback,
    WebSearchFallback,
}

impl RoutingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VectorSimilarity => "vector_similarity",
            Self::LlmFallback => "llm_fallback",
            Self::WebSearchFallback => "web_search_fallback",
        }
    }
}

impl std::fmt::Display for RoutingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of routing one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub collection: Option<CollectionKey>,
    pub method: RoutingMethod,
    /// Mean similarity per collection that returned results
    pub scores: BTreeMap<CollectionKey, f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RoutingDecision {
    /// Highest mean score, first collection wins ties
    pub fn best(&self) -> Option<(CollectionKey, f32)> {
        best_of(&self.scores)
    }
}

fn best_of(scores: &BTreeMap<CollectionKey, f32>) -> Option<(CollectionKey, f32)> {
    let mut best: Option<(CollectionKey, f32)> = None;
    for key in CollectionKey::ALL {
        if let Some(&score) = scores.get(&key) {
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((key, score));
            }
        }
    }
    best
}

/// Routes questions to a collection or to none
pub struct RoutingAgent {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LLMClient>,
    threshold: f32,
    top_k: usize,
}

impl RoutingAgent {
    pub fn new(store: Arc<dyn VectorStore>, llm: Arc<dyn LLMClient>, threshold: f32) -> Self {
        Self {
            store,
            llm,
            threshold,
            top_k: ROUTING_TOP_K,
        }
    }

    /// Mean score per collection with at least one hit
    pub async fn vector_scores(&self, question: &str) -> BTreeMap<CollectionKey, f32> {
        self.store
            .search_all_collections(question, self.top_k)
            .await
            .into_iter()
            .filter(|(_, hits)| !hits.is_empty())
            .map(|(key, hits)| {
                let mean = hits.iter().map(|h| h.score).sum::<f32>() / hits.len() as f32;
                (key, mean)
            })
            .collect()
    }

    /// Ask the chat model; anything but an exact key is rejected
    pub async fn classify(&self, question: &str) -> Result<Option<CollectionKey>> {
        let reply = self.llm.invoke(&routing_prompt(question)).await?;
        let normalized = normalize_route_reply(&reply);
        Ok(CollectionKey::from_exact(&normalized))
    }

    /// Full routing decision with scores and method
    pub async fn decide(&self, question: &str) -> RoutingDecision {
        let scores = self.vector_scores(question).await;
        tracing::debug!("Vector scores: {:?}", scores);

        if let Some((key, score)) = best_of(&scores) {
            if score >= self.threshold {
                tracing::info!("Vector similarity routing: {} (confidence {:.3})", key, score);
                return RoutingDecision {
                    collection: Some(key),
                    method: RoutingMethod::VectorSimilarity,
                    scores,
                    error: None,
                };
            }
        }
        tracing::warn!(
            "Confidence below threshold ({}), falling back to LLM routing",
            self.threshold
        );

        let mut error = None;
        match self.classify(question).await {
            Ok(Some(key)) => {
                tracing::info!("LLM routing decision: {}", key);
                return RoutingDecision {
                    collection: Some(key),
                    method: RoutingMethod::LlmFallback,
                    scores,
                    error: None,
                };
            }
            Ok(None) => tracing::warn!("LLM routing found no matching collection"),
            Err(e) => {
                tracing::warn!("LLM routing error: {}", e);
                error = Some(e.to_string());
            }
        }

        RoutingDecision {
            collection: None,
            method: RoutingMethod::WebSearchFallback,
            scores,
            error,
        }
    }
}

#[async_trait]
impl QueryRouter for RoutingAgent {
    async fn decide(&self, question: &str) -> Result<RoutingDecision> {
        if question.trim().is_empty() {
            return Err(RagRouteError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }
        Ok(RoutingAgent::decide(self, question).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{MockLlm, ScoreStore};
    use proptest::prelude::*;

    fn agent(store: ScoreStore, llm: Arc<MockLlm>) -> RoutingAgent {
        RoutingAgent::new(Arc::new(store), llm, 0.5)
    }

    #[tokio::test]
    async fn test_confident_vector_route_skips_llm() {
        let store = ScoreStore::default()
            .with(CollectionKey::Support, &[0.9, 0.8, 0.7])
            .with(CollectionKey::Finance, &[0.4]);
        let llm = Arc::new(MockLlm::replying("finance"));
        let decision = agent(store, llm.clone()).decide("How do I reset?").await;

        assert_eq!(decision.collection, Some(CollectionKey::Support));
        assert_eq!(decision.method, RoutingMethod::VectorSimilarity);
        assert!((decision.scores[&CollectionKey::Support] - 0.8).abs() < 1e-6);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_invokes_classifier() {
        let store = ScoreStore::default()
            .with(CollectionKey::Finance, &[0.42])
            .with(CollectionKey::Products, &[0.3]);
        let llm = Arc::new(MockLlm::replying("  'Finance' "));
        let decision = agent(store, llm.clone()).decide("What was Q3 revenue?").await;

        assert_eq!(llm.calls(), 1);
        assert_eq!(decision.collection, Some(CollectionKey::Finance));
        assert_eq!(decision.method, RoutingMethod::LlmFallback);
        assert_eq!(decision.best(), Some((CollectionKey::Finance, 0.42)));
    }

    #[tokio::test]
    async fn test_unrecognized_reply_routes_to_web() {
        let llm = Arc::new(MockLlm::replying("The finance database"));
        let decision = agent(ScoreStore::default(), llm).decide("Weather in Paris?").await;

        assert_eq!(decision.collection, None);
        assert_eq!(decision.method, RoutingMethod::WebSearchFallback);
        assert!(decision.scores.is_empty());
        assert!(decision.error.is_none());
    }

    #[tokio::test]
    async fn test_classifier_error_is_absorbed() {
        let store = ScoreStore::default().failing(CollectionKey::Products);
        let llm = Arc::new(MockLlm::failing());
        let decision = agent(store, llm).decide("anything").await;

        assert_eq!(decision.collection, None);
        assert_eq!(decision.method, RoutingMethod::WebSearchFallback);
        assert!(decision.error.is_some());
    }

    #[tokio::test]
    async fn test_route_via_trait() {
        let store = ScoreStore::default().with(CollectionKey::Products, &[0.5]);
        let router = agent(store, Arc::new(MockLlm::replying("support")));
        assert_eq!(
            router.route("Battery life?").await.unwrap(),
            Some(CollectionKey::Products)
        );
    }

    #[tokio::test]
    async fn test_empty_question_is_invalid_input() {
        let router = agent(ScoreStore::default(), Arc::new(MockLlm::replying("support")));
        let err = QueryRouter::decide(&router, "   ").await.unwrap_err();

        assert!(matches!(err, RagRouteError::InvalidInput(_)));
        assert_eq!(err.exit_code(), crate::error::exit_codes::INVALID_INPUT);
        assert!(err.to_string().starts_with("Invalid input"));
    }

    proptest! {
        #[test]
        fn route_yields_known_key_or_none(reply in ".{0,20}", score in 0.0f32..1.0) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = ScoreStore::default().with(CollectionKey::Finance, &[score]);
            let router = agent(store, Arc::new(MockLlm::replying(&reply)));
            let routed = runtime.block_on(router.route("question")).unwrap();
            if let Some(key) = routed {
                prop_assert!(CollectionKey::ALL.contains(&key));
            }
            if score < 0.5 {
                prop_assert_eq!(routed, CollectionKey::from_exact(&normalize_route_reply(&reply)));
            }
        }
    }
}
