//! Turning files and raw text into collection documents

use super::chunker::TextSplitter;
use super::scanner::is_text_file;
use crate::config::Config;
use crate::error::{RagRouteError, Result};
use crate::store::Document;
use std::path::{Path, PathBuf};

/// Something to ingest into a collection
#[derive(Debug, Clone)]
pub enum IngestSource {
    /// In-memory text with a display name
    Text { name: String, content: String },
    /// A file, or a directory walked for text files
    Path(PathBuf),
}

impl IngestSource {
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Name used in reports and error messages
    pub fn display_name(&self) -> String {
        match self {
            Self::Text { name, .. } => name.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

impl From<PathBuf> for IngestSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Chunks text into [`Document`]s with `filename` and `chunk_index` metadata
#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    splitter: TextSplitter,
}

impl DocumentProcessor {
    pub fn new(splitter: TextSplitter) -> Self {
        Self { splitter }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(TextSplitter::from_config(&config.chunking)?))
    }

    pub fn process_text(&self, filename: &str, content: &str) -> Vec<Document> {
        let chunks = self.splitter.split_text(content);
        let total = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                Document::new(chunk)
                    .with_metadata("filename", filename)
                    .with_metadata("chunk_index", i)
                    .with_metadata("chunk_count", total)
            })
            .collect()
    }

    /// Read and chunk one plain-text or Markdown file
    pub fn process_file(&self, path: &Path) -> Result<Vec<Document>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            return Err(RagRouteError::Document(format!(
                "PDF files are not supported: {}",
                path.display()
            )));
        }
        if !is_text_file(path) {
            return Err(RagRouteError::Document(format!(
                "unsupported file type: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes).map_err(|_| {
            RagRouteError::Document(format!("not valid UTF-8 text: {}", path.display()))
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let documents = self.process_text(&filename, &content);
        tracing::debug!("{} -> {} chunks", path.display(), documents.len());
        Ok(documents)
    }
}
