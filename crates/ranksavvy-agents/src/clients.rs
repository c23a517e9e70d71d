//! HTTP adapters for the collaborator traits.

mod anthropic;
mod nominatim;
mod scraper_service;

pub use anthropic::{AnthropicClient, UnconfiguredAnalyzer};
pub use nominatim::NominatimClient;
pub use scraper_service::ScraperServiceClient;
