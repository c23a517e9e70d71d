//! Key/value cache with TTL expiry, used to memoize every remote lookup.
//!
//! All backends fail open: a read error is a miss and a write error is
//! logged and reported as `false`. Callers never branch on the backend.

mod error;
mod file;
pub mod keys;
mod memory;
mod pattern;
mod postgres;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use ranksavvy_core::{AppConfig, CacheBackendKind};
use serde::{de::DeserializeOwned, Serialize};

pub use error::CacheError;
pub use file::FileCache;
pub use memory::MemoryCache;
pub use pattern::{glob_to_like, glob_to_regex};
pub use postgres::{connect_pool, run_migrations, PgCache, PoolConfig};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared cache contract. Safe for concurrent use on distinct keys without
/// caller-side locking.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Live value for `key`, or `None` on miss, expiry or backend error.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value`. `None` or a zero TTL uses the backend default.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool;

    async fn delete(&self, key: &str) -> bool;

    async fn exists(&self, key: &str) -> bool;

    /// Delete every key matching a `*`/`?` glob; returns how many went.
    async fn clear_pattern(&self, pattern: &str) -> usize;

    fn backend_name(&self) -> &'static str;
}

/// Build the configured backend once at start-up.
///
/// # Errors
///
/// Returns [`CacheError`] if the file directory cannot be created or the
/// Postgres pool cannot connect or migrate.
pub async fn build_cache_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>, CacheError> {
    let default_ttl = Duration::from_secs(config.cache_ttl_secs);
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackendKind::Postgres => Arc::new(PgCache::connect(config).await?),
        CacheBackendKind::File => Arc::new(FileCache::open(&config.cache_dir, default_ttl).await?),
        CacheBackendKind::Memory => Arc::new(MemoryCache::new(default_ttl)),
    };
    tracing::info!(backend = store.backend_name(), "cache backend ready");
    Ok(store)
}

/// Read and decode a JSON payload. An undecodable payload counts as a miss.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    let raw = cache.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "cached payload could not be decoded; treating as miss");
            None
        }
    }
}

/// Encode and store a JSON payload.
pub async fn set_json<T: Serialize + Sync + ?Sized>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "cache payload could not be encoded");
            return false;
        }
    };
    cache.set(key, &raw, ttl).await
}

pub(crate) fn effective_ttl(ttl: Option<Duration>, default_ttl: Duration) -> Duration {
    match ttl {
        Some(ttl) if !ttl.is_zero() => ttl,
        _ => default_ttl,
    }
}

pub(crate) fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64())
}
