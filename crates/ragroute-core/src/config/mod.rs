//! Configuration management
//!
//! Settings come from an optional YAML file and the process environment.
//! Environment values win over file values. Nothing here talks to a
//! service; [`Config::validate`] is the startup gate for fatal errors.

use crate::error::{RagRouteError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder shipped in sample env files; treated as "not configured"
const API_KEY_PLACEHOLDER: &str = "your_openai_api_key_here";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat model service
    #[serde(default)]
    pub chat: ChatConfig,

    /// Embedding model service
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector database backend
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Collection routing
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Document splitting
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Web search fallback
    #[serde(default)]
    pub web_search: WebSearchConfig,

    /// Request timeout in seconds for every HTTP client
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chat: ChatConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            routing: RoutingConfig::default(),
            chunking: ChunkingConfig::default(),
            web_search: WebSearchConfig::default(),
            timeout_secs: default_timeout(),
        }
    }
}

/// OpenAI-compatible chat completion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// API key (required at startup)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL, e.g. `https://api.openai.com/v1` or an OpenRouter endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Chat model name
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_chat_model(),
            temperature: 0.0,
        }
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// OpenAI embedding model (uses the chat key and base URL)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// ARK (Doubao) API key
    #[serde(default)]
    pub ark_api_key: Option<String>,

    /// ARK base URL; `https://` is added when no scheme is given
    #[serde(default)]
    pub ark_base_url: Option<String>,

    /// Doubao multimodal embedding model
    #[serde(default)]
    pub doubao_model: Option<String>,

    /// Texts sent per `/embeddings` request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            ark_api_key: None,
            ark_base_url: None,
            doubao_model: None,
            batch_size: default_embedding_batch_size(),
        }
    }
}

/// Which embedding provider is in effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingBackend {
    OpenAI,
    Doubao {
        api_key: String,
        base_url: String,
        model: String,
    },
}

impl EmbeddingConfig {
    /// Doubao wins when all three ARK settings are present
    pub fn backend(&self) -> EmbeddingBackend {
        match (&self.ark_api_key, &self.ark_base_url, &self.doubao_model) {
            (Some(api_key), Some(base_url), Some(model)) => EmbeddingBackend::Doubao {
                api_key: api_key.clone(),
                base_url: base_url.clone(),
                model: model.clone(),
            },
            _ => EmbeddingBackend::OpenAI,
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Qdrant cluster URL
    #[serde(default)]
    pub qdrant_url: Option<String>,

    /// Qdrant API key
    #[serde(default)]
    pub qdrant_api_key: Option<String>,

    /// Local SQLite store path (used when Qdrant is not configured)
    #[serde(default)]
    pub sqlite_path: Option<PathBuf>,

    /// Vector dimension used when creating collections
    #[serde(default = "default_vector_size")]
    pub vector_size: usize,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            qdrant_url: None,
            qdrant_api_key: None,
            sqlite_path: None,
            vector_size: default_vector_size(),
        }
    }
}

/// Which vector database backend is in effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorBackend {
    Qdrant { url: String, api_key: String },
    Sqlite { path: PathBuf },
}

impl VectorStoreConfig {
    /// Resolve the backend; Qdrant needs both URL and key
    pub fn backend(&self) -> Result<VectorBackend> {
        if let (Some(url), Some(api_key)) = (&self.qdrant_url, &self.qdrant_api_key) {
            return Ok(VectorBackend::Qdrant {
                url: url.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
            });
        }
        if let Some(path) = &self.sqlite_path {
            return Ok(VectorBackend::Sqlite { path: path.clone() });
        }
        Err(RagRouteError::Config(
            "no vector store configured: set QDRANT_URL and QDRANT_API_KEY, or RAGROUTE_SQLITE_PATH"
                .to_string(),
        ))
    }
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Minimum mean similarity for vector routing
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_threshold(),
        }
    }
}

/// Text splitter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Web search provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebSearchProvider {
    #[default]
    DuckDuckGo,
    Tavily,
}

impl std::str::FromStr for WebSearchProvider {
    type Err = RagRouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Ok(Self::DuckDuckGo),
            "tavily" => Ok(Self::Tavily),
            other => Err(RagRouteError::Config(format!(
                "unknown web search provider: {}",
                other
            ))),
        }
    }
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default)]
    pub provider: WebSearchProvider,

    #[serde(default)]
    pub tavily_api_key: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            provider: WebSearchProvider::default(),
            tavily_api_key: None,
            max_results: default_max_results(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_batch_size() -> usize {
    32
}

fn default_vector_size() -> usize {
    1536
}

fn default_threshold() -> f32 {
    0.5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_results() -> usize {
    5
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load from the default config file (if any), then apply the environment
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load from a YAML file (missing file means defaults), then apply the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        let base = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Config::default()
        };
        base.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by the process environment only
    pub fn from_env() -> Result<Self> {
        Config::default().with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Apply overrides from an environment-like lookup
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.chat.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.chat.base_url = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.chat.model = v;
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = get("EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = parse_var("EMBEDDING_BATCH_SIZE", &v)?;
        }
        if let Some(v) = get("ARK_API_KEY") {
            self.embedding.ark_api_key = Some(v);
        }
        if let Some(v) = get("ARK_BASE_URL") {
            self.embedding.ark_base_url = Some(v);
        }
        if let Some(v) = get("DOUBAO_EMBEDDING_MODEL") {
            self.embedding.doubao_model = Some(v);
        }
        if let Some(v) = get("QDRANT_URL") {
            self.vector_store.qdrant_url = Some(v);
        }
        if let Some(v) = get("QDRANT_API_KEY") {
            self.vector_store.qdrant_api_key = Some(v);
        }
        if let Some(v) = get("RAGROUTE_SQLITE_PATH") {
            self.vector_store.sqlite_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("VECTOR_SIZE") {
            self.vector_store.vector_size = parse_var("VECTOR_SIZE", &v)?;
        }
        if let Some(v) = get("SIMILARITY_THRESHOLD") {
            self.routing.similarity_threshold = parse_var("SIMILARITY_THRESHOLD", &v)?;
        }
        if let Some(v) = get("CHUNK_SIZE") {
            self.chunking.chunk_size = parse_var("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_var("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("WEB_SEARCH_PROVIDER") {
            self.web_search.provider = v.parse()?;
        }
        if let Some(v) = get("TAVILY_API_KEY") {
            self.web_search.tavily_api_key = Some(v);
        }
        if let Some(v) = get("RAGROUTE_TIMEOUT_SECS") {
            self.timeout_secs = parse_var("RAGROUTE_TIMEOUT_SECS", &v)?;
        }

        Ok(self)
    }

    /// Chat API key, ignoring the sample placeholder
    pub fn api_key(&self) -> Option<&str> {
        self.chat
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty() && *k != API_KEY_PLACEHOLDER)
    }

    /// Check everything needed to start the workflow
    pub fn validate(&self) -> Result<()> {
        if self.api_key().is_none() {
            return Err(RagRouteError::Config(
                "OpenAI API key is not configured; set OPENAI_API_KEY".to_string(),
            ));
        }
        let threshold = self.routing.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RagRouteError::Config(format!(
                "similarity threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(RagRouteError::Config(
                "embedding batch size must be positive".to_string(),
            ));
        }
        if self.chunking.chunk_size == 0 {
            return Err(RagRouteError::Config("chunk size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(RagRouteError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.web_search.provider == WebSearchProvider::Tavily
            && self.web_search.tavily_api_key.is_none()
        {
            return Err(RagRouteError::Config(
                "Tavily web search requires TAVILY_API_KEY".to_string(),
            ));
        }
        self.vector_store.backend()?;
        Ok(())
    }

    /// Copy with every secret masked, for display
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.chat.api_key = copy.chat.api_key.as_deref().map(mask_secret);
        copy.embedding.ark_api_key = copy.embedding.ark_api_key.as_deref().map(mask_secret);
        copy.vector_store.qdrant_api_key =
            copy.vector_store.qdrant_api_key.as_deref().map(mask_secret);
        copy.web_search.tavily_api_key =
            copy.web_search.tavily_api_key.as_deref().map(mask_secret);
        copy
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RagRouteError::Config(format!("invalid value for {}: {}", name, value)))
}

/// Keep the first and last four characters of long secrets
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
