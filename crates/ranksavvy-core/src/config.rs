use crate::app_config::{AppConfig, CacheBackendKind, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let env = parse_environment(&or_default("RANKSAVVY_ENV", "development"));
    let bind_addr = parse_addr("RANKSAVVY_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = or_default("RANKSAVVY_LOG_LEVEL", "info");

    let cache_backend = parse_cache_backend(&or_default("RANKSAVVY_CACHE_BACKEND", "file"))
        .map_err(|reason| invalid("RANKSAVVY_CACHE_BACKEND", reason))?;
    let database_url = optional("DATABASE_URL");
    if cache_backend == CacheBackendKind::Postgres && database_url.is_none() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }
    let cache_dir = PathBuf::from(or_default("RANKSAVVY_CACHE_DIR", "./.cache"));
    let cache_ttl_secs = parse_u64("RANKSAVVY_CACHE_TTL_SECS", "86400")?;
    if cache_ttl_secs == 0 {
        return Err(invalid(
            "RANKSAVVY_CACHE_TTL_SECS",
            "TTL must be greater than zero".to_string(),
        ));
    }

    let db_max_connections = parse_u32("RANKSAVVY_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RANKSAVVY_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RANKSAVVY_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let scraper_base_url = or_default("RANKSAVVY_SCRAPER_URL", "http://localhost:9300");
    let scraper_api_key = optional("RANKSAVVY_SCRAPER_API_KEY");
    let scraper_request_timeout_secs = parse_u64("RANKSAVVY_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("RANKSAVVY_USER_AGENT", "ranksavvy/0.1 (niche-finder)");

    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let anthropic_model = or_default("RANKSAVVY_ANTHROPIC_MODEL", "claude-3-sonnet-20240229");
    let anthropic_base_url = or_default("RANKSAVVY_ANTHROPIC_URL", "https://api.anthropic.com");
    let geocoder_base_url = or_default(
        "RANKSAVVY_GEOCODER_URL",
        "https://nominatim.openstreetmap.org",
    );

    let max_concurrent_lookups = parse_usize("RANKSAVVY_MAX_CONCURRENT_LOOKUPS", "10")?;
    let region_clusters_validated = parse_bool("RANKSAVVY_REGION_CLUSTERS_VALIDATED", "false")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        cache_backend,
        database_url,
        cache_dir,
        cache_ttl_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        scraper_base_url,
        scraper_api_key,
        scraper_request_timeout_secs,
        user_agent,
        anthropic_api_key,
        anthropic_model,
        anthropic_base_url,
        geocoder_base_url,
        max_concurrent_lookups,
        region_clusters_validated,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_cache_backend(s: &str) -> Result<CacheBackendKind, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => Ok(CacheBackendKind::Postgres),
        "file" => Ok(CacheBackendKind::File),
        "memory" => Ok(CacheBackendKind::Memory),
        other => Err(format!(
            "unknown cache backend '{other}' (expected postgres, file or memory)"
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
