//! Object-safe seams for the external services the agents depend on.
//!
//! Production wiring uses the HTTP adapters in [`crate::clients`]; tests
//! substitute in-process fakes.

use std::sync::Arc;

use async_trait::async_trait;
use ranksavvy_core::{AppConfig, Coordinates, LocalListing, PopulationDensity, SerpPage, SiteData};
use serde::Deserialize;

use crate::clients::{AnthropicClient, NominatimClient, ScraperServiceClient, UnconfiguredAnalyzer};
use crate::error::AgentError;

/// Browser-automation service that turns queries and URLs into page data.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape_serp(&self, query: &str, location: Option<&str>)
        -> Result<SerpPage, AgentError>;

    async fn autocomplete(&self, query: &str, location: Option<&str>)
        -> Result<Vec<String>, AgentError>;

    async fn local_listings(&self, query: &str, location: &str)
        -> Result<Vec<LocalListing>, AgentError>;

    async fn scrape_site(&self, url: &str) -> Result<SiteData, AgentError>;
}

/// Free-text generation. Callers parse the reply themselves.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, AgentError>;
}

#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Place>, AgentError>;

    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, AgentError>;
}

/// Administrative address fields as reported by the geocoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
}

impl Address {
    /// Most specific settlement name: city, then town, then village.
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
    }

    #[must_use]
    pub fn population_density(&self) -> PopulationDensity {
        if self.city.is_some() {
            PopulationDensity::Urban
        } else if self.town.is_some() {
            PopulationDensity::Suburban
        } else if self.village.is_some() || self.hamlet.is_some() {
            PopulationDensity::Rural
        } else {
            PopulationDensity::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub coordinates: Coordinates,
    pub address: Address,
}

/// The three collaborators, shared by every agent.
#[derive(Clone)]
pub struct Collaborators {
    pub scraper: Arc<dyn Scraper>,
    pub analyzer: Arc<dyn TextAnalyzer>,
    pub geo: Arc<dyn GeoResolver>,
}

impl Collaborators {
    /// Build the HTTP adapters from configuration.
    ///
    /// Without `ANTHROPIC_API_KEY` the analyzer is [`UnconfiguredAnalyzer`],
    /// so AI-backed steps degrade to empty results.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if an HTTP client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, AgentError> {
        let scraper = ScraperServiceClient::with_base_url(
            &config.scraper_base_url,
            config.scraper_api_key.as_deref(),
            config.scraper_request_timeout_secs,
            &config.user_agent,
        )?;

        let analyzer: Arc<dyn TextAnalyzer> = match config.anthropic_api_key.as_deref() {
            Some(api_key) => Arc::new(AnthropicClient::with_base_url(
                &config.anthropic_base_url,
                api_key,
                &config.anthropic_model,
                config.scraper_request_timeout_secs,
            )?),
            None => {
                tracing::warn!("ANTHROPIC_API_KEY not set; AI suggestions will be empty");
                Arc::new(UnconfiguredAnalyzer)
            }
        };

        let geo = NominatimClient::with_base_url(
            &config.geocoder_base_url,
            config.scraper_request_timeout_secs,
            &config.user_agent,
        )?;

        Ok(Self {
            scraper: Arc::new(scraper),
            analyzer,
            geo: Arc::new(geo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locality_prefers_city_then_town_then_village() {
        let address = Address {
            town: Some("Pelham".to_string()),
            village: Some("Helena".to_string()),
            ..Address::default()
        };
        assert_eq!(address.locality(), Some("Pelham"));
    }

    #[test]
    fn hamlet_is_rural_but_not_a_locality() {
        let address = Address {
            hamlet: Some("Dogtown".to_string()),
            ..Address::default()
        };
        assert_eq!(address.population_density(), PopulationDensity::Rural);
        assert_eq!(address.locality(), None);
    }

    #[test]
    fn density_classes() {
        let city = Address {
            city: Some("Birmingham".to_string()),
            ..Address::default()
        };
        assert_eq!(city.population_density(), PopulationDensity::Urban);
        assert_eq!(
            Address::default().population_density(),
            PopulationDensity::Unknown
        );
    }
}
