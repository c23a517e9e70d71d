use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::pattern::glob_to_regex;
use crate::{effective_ttl, CacheStore};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local cache. Expired entries are dropped when read and swept on
/// every write.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    default_ttl: Duration,
}

impl MemoryCache {
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TTL)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if Instant::now() <= entry.expires_at => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| Instant::now() > entry.expires_at)
        {
            entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        let expires_at = now + effective_ttl(ttl, self.default_ttl);
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at >= now);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn clear_pattern(&self, pattern: &str) -> usize {
        let matcher = match glob_to_regex(pattern) {
            Ok(matcher) => matcher,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "invalid cache key pattern");
                return 0;
            }
        };
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !matcher.is_match(key));
        before - entries.len()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
