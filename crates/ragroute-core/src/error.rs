//! Error types for ragroute

use thiserror::Error;

/// Result type alias using RagRouteError
pub type Result<T> = std::result::Result<T, RagRouteError>;

/// Error type alias for convenience
pub type Error = RagRouteError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for ragroute
#[derive(Debug, Error)]
pub enum RagRouteError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("No results found: {0}")]
    NoResults(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document processing error: {0}")]
    Document(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RagRouteError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownCollection(_) | Self::NoResults(_) => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::InvalidInput(_) | Self::Document(_) => {
                exit_codes::INVALID_INPUT
            },
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Build an error from a non-success HTTP response
    pub(crate) async fn from_response(service: &str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::ExternalError(format!("{} error (HTTP {}): {}", service, status, body))
    }
}
