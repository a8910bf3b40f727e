//! Prompt templates for routing and question answering

use crate::collections::{CollectionKey, COLLECTIONS};
use crate::llm::ChatMessage;
use crate::store::ScoredDocument;

/// Classification prompt asking for exactly one collection key
pub fn routing_prompt(question: &str) -> String {
    let keys: Vec<String> = CollectionKey::ALL
        .iter()
        .map(|k| format!("'{}'", k.as_str()))
        .collect();

    let rules: Vec<String> = COLLECTIONS
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} -> return '{}'", i + 1, c.description, c.key.as_str()))
        .collect();

    format!(
        r#"You are a query routing expert. Analyze the question and decide which database should answer it.

You must return exactly one of: {keys}.

Routing rules:
{rules}
- Product questions cover features, specifications, project details and manuals.
- Support questions cover help, guidance, troubleshooting, customer service, FAQs and guides.
- Finance questions cover costs, revenue, pricing, financial data, financial reports and investments.

Important: return only the database name, with no other text or explanation.

Question: {question}"#,
        keys = keys.join(", "),
        rules = rules.join("\n"),
        question = question
    )
}

/// Normalize a classifier reply: trim, strip quotes and backticks, lowercase
pub fn normalize_route_reply(reply: &str) -> String {
    reply
        .trim()
        .chars()
        .filter(|c| !matches!(c, '`' | '\'' | '"'))
        .collect::<String>()
        .to_lowercase()
}

/// Message sequence for a context-grounded answer
pub fn qa_messages(question: &str, documents: &[ScoredDocument]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You are a helpful AI assistant that answers questions from the provided context.\n\n\
             Guidelines:\n\
             - Always respond directly and concisely\n\
             - If the context does not contain enough information to fully answer, say so\n\
             - Answer strictly from the provided context and avoid assumptions",
        ),
        ChatMessage::user(format!(
            "Here is the context:\n{}",
            format_context(documents)
        )),
        ChatMessage::user(format!("Question: {}", question)),
        ChatMessage::assistant("I will answer your question based on the provided context."),
        ChatMessage::user("Please provide your answer:"),
    ]
}

/// Prompt for the context-free general knowledge tier
pub fn general_knowledge_prompt(question: &str) -> String {
    format!(
        "Please answer the following question from your own knowledge: {}",
        question
    )
}

/// Join document contents, separated by blank lines
pub fn format_context(documents: &[ScoredDocument]) -> String {
    documents
        .iter()
        .map(|d| d.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Label prefixed to web search answers
pub const WEB_SEARCH_LABEL: &str =
    "No relevant documents were found in the knowledge base. Here are the web search results:";

/// Label prefixed to general knowledge answers
pub const GENERAL_KNOWLEDGE_LABEL: &str =
    "Web search is unavailable. Answer based on general knowledge:";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Document;

    #[test]
    fn test_routing_prompt_lists_every_key() {
        let prompt = routing_prompt("What was Q3 revenue?");
        for key in CollectionKey::ALL {
            assert!(prompt.contains(&format!("'{}'", key.as_str())));
        }
        assert!(prompt.ends_with("Question: What was Q3 revenue?"));
    }

    #[test]
    fn test_normalize_route_reply() {
        assert_eq!(normalize_route_reply("  'Finance'\n"), "finance");
        assert_eq!(normalize_route_reply("`support`"), "support");
        assert_eq!(normalize_route_reply("\"PRODUCTS\""), "products");
        assert_eq!(normalize_route_reply("finance."), "finance.");
        assert_eq!(normalize_route_reply("' finance'"), " finance");
    }

    #[test]
    fn test_qa_messages_embed_context() {
        let docs = vec![
            ScoredDocument::new(Document::new("Refunds take 5 days."), 0.9),
            ScoredDocument::new(Document::new("Contact support by email."), 0.8),
        ];
        let messages = qa_messages("How long do refunds take?", &docs);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1]
            .content
            .contains("Refunds take 5 days.\n\nContact support by email."));
        assert_eq!(messages[2].content, "Question: How long do refunds take?");
        assert_eq!(messages.last().unwrap().role, "user");
    }
}
