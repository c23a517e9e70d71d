use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ranksavvy_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::pattern::glob_to_like;
use crate::{effective_ttl, CacheError, CacheStore};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/ranksavvy-cache/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Shared cache backed by the `cache_entries` table.
#[derive(Debug, Clone)]
pub struct PgCache {
    pool: PgPool,
    default_ttl: Duration,
}

impl PgCache {
    #[must_use]
    pub fn new(pool: PgPool, default_ttl: Duration) -> Self {
        Self { pool, default_ttl }
    }

    /// Connect using the configured `DATABASE_URL` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::MissingDatabaseUrl`] if no URL is configured, or
    /// a connection/migration error.
    pub async fn connect(config: &AppConfig) -> Result<Self, CacheError> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or(CacheError::MissingDatabaseUrl)?;
        let pool = connect_pool(database_url, PoolConfig::from_app_config(config)).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(
            pool,
            Duration::from_secs(config.cache_ttl_secs),
        ))
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Sqlx`] if a query fails.
    pub async fn try_get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            "SELECT value, expires_at FROM cache_entries WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some((value, expires_at)) = row else {
            return Ok(None);
        };
        if Utc::now() > expires_at {
            sqlx::query("DELETE FROM cache_entries WHERE key = $1 AND expires_at < NOW()")
                .bind(key)
                .execute(&self.pool)
                .await?;
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Sqlx`] if the upsert fails.
    pub async fn try_set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let ttl = effective_ttl(ttl, self.default_ttl);
        let created_at = Utc::now();
        let expires_at = created_at
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));

        sqlx::query(
            "INSERT INTO cache_entries (key, value, created_at, expires_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (key) DO UPDATE \
             SET value = EXCLUDED.value, \
                 created_at = EXCLUDED.created_at, \
                 expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        self.purge_expired().await?;
        Ok(())
    }

    /// Drop every expired row, including keys that are never read again.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Sqlx`] if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Sqlx`] if the delete fails.
    pub async fn try_delete(&self, key: &str) -> Result<bool, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Sqlx`] if the delete fails.
    pub async fn try_clear_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key LIKE $1")
            .bind(glob_to_like(pattern))
            .execute(&self.pool)
            .await?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }
}

#[async_trait]
impl CacheStore for PgCache {
    async fn get(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "postgres cache read failed; treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> bool {
        match self.try_set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "postgres cache write failed");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(key, error = %e, "postgres cache delete failed");
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
                tracing::warn!(pattern, error = %e, "postgres cache clear failed");
                0
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
