mod app_config;
mod competitor;
mod config;
mod keyword;
mod location;
mod lookup;
mod report;
mod serp;

pub use app_config::{AppConfig, CacheBackendKind, Environment};
pub use competitor::{
    CompetitorEntry, CompetitorRecord, CompetitorSet, CompetitorType, ContentAnalysis,
    ContentStrategy, InternalLink, KeywordLandscape, LocalData, LocalListing, SiteData,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use keyword::{Intent, KeywordCategory, KeywordDiscoveryResult, KeywordRecord};
pub use location::{
    Bounds, ClusterType, Coordinates, Location, LocationCluster, NearbyCity, PopulationDensity,
    ServiceArea,
};
pub use lookup::Lookup;
pub use report::{
    AnalysisOptions, AnalysisResult, ContentGap, ContentGapKind, OpportunitySet, Priority,
    Recommendation, Recommendations, SurpriseOpportunity,
};
pub use serp::{
    AdResult, CompetitionLevel, LocalPackEntry, OrganicResult, SerpFeatureSet, SerpPage,
    VolumeEstimate, VolumeIndicators,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
