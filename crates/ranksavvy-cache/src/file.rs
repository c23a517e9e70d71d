use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::pattern::glob_to_regex;
use crate::{effective_ttl, now_epoch_secs, CacheError, CacheStore};

/// On-disk entry layout. Times are float epoch seconds.
///
/// File names are lossy (see [`sanitize`]), so the full key is stored and
/// checked on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CacheEntry {
    #[serde(default)]
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) expires_at: f64,
    pub(crate) created_at: f64,
}

/// One JSON file per key under a single directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    default_ttl: Duration,
}

impl FileCache {
    /// Open (creating if needed) a cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>, default_ttl: Duration) -> Result<Self, CacheError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, default_ttl })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }

    /// Read a live entry, deleting it if it has expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on I/O failure or an unreadable entry.
    pub async fn try_get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_str(&raw)?;
        if entry.key != key {
            tracing::debug!(key, stored = %entry.key, "file cache name collision; treating as miss");
            return Ok(None);
        }
        if now_epoch_secs() > entry.expires_at {
            remove_if_present(&path).await?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    /// Write an entry via a temp file renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the entry cannot be encoded or written.
    pub async fn try_set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let created_at = now_epoch_secs();
        let entry = CacheEntry {
            key: key.to_string(),
            value: value.to_string(),
            expires_at: created_at + effective_ttl(ttl, self.default_ttl).as_secs_f64(),
            created_at,
        };
        let body = serde_json::to_vec(&entry)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", sanitize(key), uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, &body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Io`] on any failure other than a missing file.
    pub async fn try_delete(&self, key: &str) -> Result<bool, CacheError> {
        remove_if_present(&self.path_for(key)).await
    }

    /// Delete every entry whose stored key matches the glob. Entries
    /// without a readable key are matched on their file stem instead.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the pattern is invalid or the directory
    /// cannot be listed.
    pub async fn try_clear_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let invalid = |source| CacheError::Pattern {
            pattern: pattern.to_string(),
            source,
        };
        let key_matcher = glob_to_regex(pattern).map_err(invalid)?;
        let stem_matcher = glob_to_regex(&sanitize(pattern)).map_err(invalid)?;

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let matched = match stored_key(&path).await {
                Some(key) => key_matcher.is_match(&key),
                None => stem_matcher.is_match(stem),
            };
            if matched && remove_if_present(&path).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "file cache read failed; treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        match self.try_set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "file cache write failed");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(key, error = %e, "file cache delete failed");
                false
            }
        }
    }

    async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn clear_pattern(&self, pattern: &str) -> usize {
        match self.try_clear_pattern(pattern).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(pattern, error = %e, "file cache clear failed");
                0
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

/// File-name form of a key: `:` and `/` become `_`.
pub(crate) fn sanitize(key: &str) -> String {
    key.replace([':', '/'], "_")
}

async fn stored_key(path: &Path) -> Option<String> {
    let raw = tokio::fs::read_to_string(path).await.ok()?;
    let entry: CacheEntry = serde_json::from_str(&raw).ok()?;
    Some(entry.key).filter(|key| !key.is_empty())
}

async fn remove_if_present(path: &Path) -> Result<bool, CacheError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
