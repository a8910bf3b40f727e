//! Recursive character text splitting
//!
//! Text is split on the first separator that occurs in it, small pieces are
//! merged back up to `chunk_size` characters, and pieces that are still too
//! long are split again with the remaining separators. Lengths are counted in
//! characters, never bytes, so chunks always end on a UTF-8 boundary.

use crate::config::ChunkingConfig;
use crate::error::{RagRouteError, Result};
use std::collections::VecDeque;

/// Separators tried in order; the empty separator splits into characters
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splitter producing chunks of at most `chunk_size` characters
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagRouteError::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagRouteError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut short_pieces: Vec<&str> = Vec::new();

        for piece in split_on(text, separator) {
            if char_len(piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }
            if !short_pieces.is_empty() {
                chunks.extend(self.merge_splits(&short_pieces, separator));
                short_pieces.clear();
            }
            if remaining.is_empty() {
                let trimmed = piece.trim();
                if !trimmed.is_empty() {
                    chunks.push(trimmed.to_string());
                }
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            chunks.extend(self.merge_splits(&short_pieces, separator));
        }

        chunks
    }

    /// Greedily join pieces up to `chunk_size`, carrying up to `chunk_overlap`
    /// characters of trailing pieces into the next chunk
    fn merge_splits(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joined_len = |current: &VecDeque<&str>, total: usize| {
                total + len + if current.is_empty() { 0 } else { separator_len }
            };

            if joined_len(&current, total) > self.chunk_size && !current.is_empty() {
                if let Some(chunk) = join_chunk(&current, separator) {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap
                    || (joined_len(&current, total) > self.chunk_size && total > 0)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let dropped = char_len(first) + if current.is_empty() { 0 } else { separator_len };
                    total = total.saturating_sub(dropped);
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(chunk) = join_chunk(&current, separator) {
            chunks.push(chunk);
        }

        chunks
    }
}

fn join_chunk(pieces: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
