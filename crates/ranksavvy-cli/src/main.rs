mod cache;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use ranksavvy_agents::{AgentSettings, Collaborators, LeadAgent};
use ranksavvy_cache::CacheStore;
use ranksavvy_core::AnalysisOptions;
use tracing_subscriber::EnvFilter;

use crate::cache::{run_cache, CacheCommands};

#[derive(Debug, Parser)]
#[command(name = "ranksavvy")]
#[command(about = "Local-service niche analysis from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full niche analysis and print the report as JSON
    Analyze {
        /// Service to analyse, e.g. "HVAC repair"
        query: String,
        /// Target place, e.g. "Pelham Alabama"
        location: String,
        /// Service-area radius in miles
        #[arg(long)]
        radius: Option<f64>,
        /// Also probe related services for underserved markets
        #[arg(long)]
        surprise: bool,
    },
    /// Print autocomplete suggestions for a query
    Autocomplete {
        query: String,
        #[arg(long)]
        location: Option<String>,
    },
    /// Suggest location clusters around a place
    Clusters {
        location: String,
        /// Search radius in miles
        #[arg(long, default_value = "30")]
        radius: f64,
    },
    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ranksavvy_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cache = ranksavvy_cache::build_cache_store(&config).await?;

    match cli.command {
        Commands::Cache { command } => run_cache(cache.as_ref(), command).await,
        Commands::Analyze {
            query,
            location,
            radius,
            surprise,
        } => {
            let options = AnalysisOptions {
                radius,
                surprise_me: surprise,
            };
            let result = build_lead(&config, cache)?
                .analyze_niche(&query, &location, options)
                .await;
            if let Some(error) = &result.error {
                tracing::warn!(error = %error, "analysis finished with a partial report");
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Autocomplete { query, location } => {
            let suggestions = build_lead(&config, cache)?
                .scraper()
                .autocomplete(&query, location.as_deref())
                .await?;
            for suggestion in suggestions {
                println!("{suggestion}");
            }
        }
        Commands::Clusters { location, radius } => {
            let lead = build_lead(&config, cache)?;
            let geo = lead.geo().analyze_location(&location, Some(radius)).await;
            if let Some(error) = geo.error {
                anyhow::bail!("could not resolve '{location}': {error}");
            }
            let primary = geo.city.as_deref().unwrap_or(&location);
            let clusters = lead
                .geo()
                .suggest_location_clusters(primary, &geo.nearby_cities);
            println!("{}", serde_json::to_string_pretty(&clusters)?);
        }
    }

    Ok(())
}

fn build_lead(
    config: &ranksavvy_core::AppConfig,
    cache: Arc<dyn CacheStore>,
) -> anyhow::Result<LeadAgent> {
    Ok(LeadAgent::new(
        Collaborators::from_app_config(config)?,
        cache,
        AgentSettings::from_app_config(config),
    ))
}
