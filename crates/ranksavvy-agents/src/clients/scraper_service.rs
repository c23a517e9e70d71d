//! HTTP client for the browser-automation scraper service.
//!
//! The service exposes one JSON POST endpoint per page type and returns the
//! structured page data directly. Proxying, fingerprinting and retries live
//! behind it.

use std::time::Duration;

use async_trait::async_trait;
use ranksavvy_core::{LocalListing, SerpPage, SiteData};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collaborators::Scraper;
use crate::error::AgentError;

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SiteRequest<'a> {
    url: &'a str,
}

pub struct ScraperServiceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ScraperServiceClient {
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<&str>,
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
            api_key: api_key.map(str::to_owned),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AgentError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self.client.post(&url).json(body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| AgentError::Deserialize {
            context: url,
            source,
        })
    }
}

#[async_trait]
impl Scraper for ScraperServiceClient {
    async fn scrape_serp(
        &self,
        query: &str,
        location: Option<&str>,
    ) -> Result<SerpPage, AgentError> {
        self.post_json("serp", &QueryRequest { query, location })
            .await
    }

    async fn autocomplete(
        &self,
        query: &str,
        location: Option<&str>,
    ) -> Result<Vec<String>, AgentError> {
        self.post_json("autocomplete", &QueryRequest { query, location })
            .await
    }

    async fn local_listings(
        &self,
        query: &str,
        location: &str,
    ) -> Result<Vec<LocalListing>, AgentError> {
        self.post_json(
            "maps",
            &QueryRequest {
                query,
                location: Some(location),
            },
        )
        .await
    }

    async fn scrape_site(&self, url: &str) -> Result<SiteData, AgentError> {
        self.post_json("site", &SiteRequest { url }).await
    }
}
