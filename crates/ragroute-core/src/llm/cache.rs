//! Query embedding cache
//!
//! Routing searches every collection with the same question, so the query
//! vector is computed once and served from here afterwards.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};

/// Cache entry with TTL
#[derive(Clone)]
struct CacheEntry {
    value: Vec<f32>,
    expires_at: SystemTime,
}

/// In-memory cache for embeddings
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl EmbeddingCache {
    /// Create new cache with default TTL of 1 hour
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(3600))
    }

    /// Create cache with custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: 1024,
        }
    }

    /// Get cached value if exists and not expired
    pub fn get(&self, key: &str) -> Option<Vec<f32>> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;

        if SystemTime::now() < entry.expires_at {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Store a value; expired entries are purged when the cache is full
    pub fn set(&self, key: String, value: Vec<f32>) {
        if let Ok(mut entries) = self.entries.write() {
            if entries.len() >= self.max_entries {
                let now = SystemTime::now();
                entries.retain(|_, entry| now < entry.expires_at);
                if entries.len() >= self.max_entries {
                    entries.clear();
                }
            }
            entries.insert(
                key,
                CacheEntry {
                    value,
                    expires_at: SystemTime::now() + self.ttl,
                },
            );
        }
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate cache key for embeddings
pub fn embedding_cache_key(model: &str, text: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    text.hash(&mut hasher);
    format!("embed:{}:{:x}", model, hasher.finish())
}
