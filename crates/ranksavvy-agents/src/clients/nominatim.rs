//! Nominatim-compatible geocoder used as the [`GeoResolver`].

use std::time::Duration;

use async_trait::async_trait;
use ranksavvy_core::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::collaborators::{Address, GeoResolver, Place};
use crate::error::AgentError;

/// Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct RawPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    address: Address,
}

impl RawPlace {
    fn into_place(self) -> Result<Place, AgentError> {
        let lat = self
            .lat
            .parse::<f64>()
            .map_err(|e| AgentError::Geocoder(format!("invalid latitude '{}': {e}", self.lat)))?;
        let lon = self
            .lon
            .parse::<f64>()
            .map_err(|e| AgentError::Geocoder(format!("invalid longitude '{}': {e}", self.lon)))?;
        Ok(Place {
            coordinates: Coordinates::new(lat, lon),
            address: self.address,
        })
    }
}

/// Reverse lookups over open water return `{"error": "Unable to geocode"}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReverseResponse {
    Found(RawPlace),
    Miss {
        #[serde(rename = "error")]
        _reason: String,
    },
}

/// Spacing between requests required by the public Nominatim usage policy.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

pub struct NominatimClient {
    client: Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            last_request: Mutex::new(None),
        })
    }

    /// Override the minimum spacing between requests. Self-hosted
    /// instances can use [`Duration::ZERO`].
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Hold the caller until `min_interval` has passed since the previous
    /// request started.
    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.min_interval).await;
        }
        *last = Some(Instant::now());
    }

    async fn get_text(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<(String, String), AgentError> {
        self.wait_turn().await;
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("format", "jsonv2"), ("addressdetails", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        Ok((url, response.text().await?))
    }
}

#[async_trait]
impl GeoResolver for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<Place>, AgentError> {
        let (url, body) = self
            .get_text("search", &[("q", query.to_string()), ("limit", "1".to_string())])
            .await?;
        let places: Vec<RawPlace> =
            serde_json::from_str(&body).map_err(|source| AgentError::Deserialize {
                context: url,
                source,
            })?;
        places.into_iter().next().map(RawPlace::into_place).transpose()
    }

    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, AgentError> {
        let (url, body) = self
            .get_text(
                "reverse",
                &[("lat", point.lat.to_string()), ("lon", point.lon.to_string())],
            )
            .await?;
        let response: ReverseResponse =
            serde_json::from_str(&body).map_err(|source| AgentError::Deserialize {
                context: url,
                source,
            })?;
        match response {
            ReverseResponse::Found(raw) => raw.into_place().map(Some),
            ReverseResponse::Miss { .. } => Ok(None),
        }
    }
}
