use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which cache backend the process uses. Chosen once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    /// Shared `cache_entries` table; safe across processes.
    Postgres,
    /// One JSON file per key under `cache_dir`.
    File,
    /// Process-local map; lost on exit.
    Memory,
}

impl std::fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendKind::Postgres => write!(f, "postgres"),
            CacheBackendKind::File => write!(f, "file"),
            CacheBackendKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub cache_backend: CacheBackendKind,
    pub database_url: Option<String>,
    pub cache_dir: PathBuf,
    pub cache_ttl_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub scraper_base_url: String,
    pub scraper_api_key: Option<String>,
    pub scraper_request_timeout_secs: u64,
    pub user_agent: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub geocoder_base_url: String,
    pub max_concurrent_lookups: usize,
    pub region_clusters_validated: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("cache_backend", &self.cache_backend)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("cache_dir", &self.cache_dir)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scraper_base_url", &self.scraper_base_url)
            .field(
                "scraper_api_key",
                &self.scraper_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("user_agent", &self.user_agent)
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("anthropic_model", &self.anthropic_model)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("max_concurrent_lookups", &self.max_concurrent_lookups)
            .field(
                "region_clusters_validated",
                &self.region_clusters_validated,
            )
            .finish()
    }
}
