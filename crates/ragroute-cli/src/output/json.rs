//! JSON output formatter

use super::AnswerOptions;
use ragroute_core::agents::source_previews;
use ragroute_core::{RoutingDecision, WorkflowOutcome};
use serde::Serialize;

pub fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

pub fn format_outcome(outcome: &WorkflowOutcome, options: &AnswerOptions) -> String {
    let mut output = serde_json::json!({
        "question": outcome.question,
        "answer": outcome.answer,
        "collection": outcome.collection,
        "answer_source": outcome.answer_source,
        "num_documents": outcome.num_documents,
        "success": outcome.success,
        "error": outcome.error,
        "trace": outcome.trace,
    });

    if options.show_routing {
        output["routing"] = serde_json::to_value(&outcome.routing).unwrap_or_default();
    }
    if options.show_sources {
        output["sources"] =
            serde_json::to_value(source_previews(&outcome.documents)).unwrap_or_default();
    }

    to_pretty(&output)
}

pub fn format_decision(question: &str, decision: &RoutingDecision) -> String {
    to_pretty(&serde_json::json!({
        "question": question,
        "collection": decision.collection,
        "method": decision.method,
        "scores": decision.scores,
        "error": decision.error,
    }))
}
