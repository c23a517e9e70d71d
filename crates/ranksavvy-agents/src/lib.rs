//! Agents that gather niche signals and the orchestrator that combines them.

pub mod clients;
pub mod collaborators;
pub mod competitor;
mod error;
pub mod geo;
pub mod keyword;
pub mod lead;
pub mod runner;
pub mod scoring;
pub mod scraper;

pub use collaborators::{Address, Collaborators, GeoResolver, Place, Scraper, TextAnalyzer};
pub use competitor::CompetitorAgent;
pub use error::AgentError;
pub use geo::GeoAgent;
pub use keyword::KeywordAgent;
pub use lead::{AgentSettings, AnalysisProgress, LeadAgent, PipelineStep};
pub use runner::{ParallelTaskRunner, TaskOutcome};
pub use scoring::{keyword_value, serp_feature_score};
pub use scraper::{KeywordProbe, ScraperAgent};
