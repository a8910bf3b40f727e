//! Terminal output formatter

use super::AnswerOptions;
use ragroute_core::agents::source_previews;
use ragroute_core::{DetailedAnswer, RoutingDecision, SourcePreview, WorkflowOutcome};

pub fn format_outcome(outcome: &WorkflowOutcome, options: &AnswerOptions) -> String {
    let mut output = String::new();
    output.push_str(&outcome.answer);
    output.push('\n');

    if options.show_routing {
        output.push('\n');
        match &outcome.routing {
            Some(decision) => output.push_str(&format_decision(decision)),
            None => output.push_str("Routing: unavailable\n"),
        }
        if let Some(source) = outcome.answer_source {
            output.push_str(&format!("Answered from: {}\n", source));
        }
    }

    if options.show_sources && !outcome.documents.is_empty() {
        output.push_str(&format_sources(
            outcome.num_documents,
            &source_previews(&outcome.documents),
        ));
    }

    if let Some(error) = &outcome.error {
        output.push_str(&format!("\nError: {}\n", error));
    }

    output
}

pub fn format_detailed(answer: &DetailedAnswer) -> String {
    let mut output = String::new();
    output.push_str(&answer.answer);
    output.push('\n');
    output.push_str(&format!("\nAnswered from: {}\n", answer.source));
    if !answer.sources.is_empty() {
        output.push_str(&format_sources(answer.num_sources, &answer.sources));
    }
    output
}

fn format_sources(total: usize, previews: &[SourcePreview]) -> String {
    let mut output = format!("\nSources ({}):\n", total);
    for preview in previews {
        let filename = preview
            .metadata
            .get("filename")
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        output.push_str(&format!(
            "{:>3}. {:>3}% {}\n",
            preview.index,
            (preview.score * 100.0) as i32,
            filename
        ));
        for line in preview.content_preview.lines() {
            output.push_str(&format!("     {}\n", line));
        }
    }
    output
}

pub fn format_decision(decision: &RoutingDecision) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Collection: {}\n",
        decision
            .collection
            .map(|k| k.descriptor().name)
            .unwrap_or("none (web search)")
    ));
    output.push_str(&format!("Method:     {}\n", decision.method));

    if !decision.scores.is_empty() {
        output.push_str("Scores:\n");
        for (key, score) in &decision.scores {
            output.push_str(&format!("  {:<10} {:.3}\n", key.as_str(), score));
        }
    }
    if let Some(error) = &decision.error {
        output.push_str(&format!("Note:       {}\n", error));
    }

    output
}
