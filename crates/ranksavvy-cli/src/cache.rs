//! Cache maintenance commands. These never touch the collaborators.

use clap::Subcommand;
use ranksavvy_cache::CacheStore;

/// Sub-commands available under `cache`.
#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Delete every entry whose key matches a glob (`*` and `?`)
    Clear {
        /// Key pattern, e.g. `serp:*` or `niche_analysis:HVAC*`
        pattern: String,
    },
    /// Delete a single entry by exact key
    Delete { key: String },
}

pub(crate) async fn run_cache(cache: &dyn CacheStore, command: CacheCommands) {
    match command {
        CacheCommands::Clear { pattern } => {
            let removed = cache.clear_pattern(&pattern).await;
            tracing::info!(pattern = %pattern, removed, backend = cache.backend_name(), "cache cleared");
            println!("removed {removed} entries matching '{pattern}'");
        }
        CacheCommands::Delete { key } => {
            if cache.delete(&key).await {
                println!("deleted '{key}'");
            } else {
                println!("no entry for '{key}'");
            }
        }
    }
}
