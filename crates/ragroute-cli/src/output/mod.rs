//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use ragroute_core::{DetailedAnswer, IngestReport, RoutingDecision, WorkflowOutcome};

/// What to include when printing an answer
pub struct AnswerOptions {
    pub show_routing: bool,
    pub show_sources: bool,
}

pub fn format_outcome(
    outcome: &WorkflowOutcome,
    format: OutputFormat,
    options: &AnswerOptions,
) -> String {
    match format {
        OutputFormat::Json => json::format_outcome(outcome, options),
        OutputFormat::Cli => terminal::format_outcome(outcome, options),
    }
}

pub fn format_detailed(answer: &DetailedAnswer, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(answer),
        OutputFormat::Cli => terminal::format_detailed(answer),
    }
}

pub fn format_decision(question: &str, decision: &RoutingDecision, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_decision(question, decision),
        OutputFormat::Cli => terminal::format_decision(decision),
    }
}

pub fn format_ingest(report: &IngestReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::to_pretty(report),
        OutputFormat::Cli => format!("{}\n", report.message()),
    }
}
