//! Cached, typed access to the [`Scraper`] collaborator.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ranksavvy_cache::{get_json, keys, set_json, CacheStore};
use ranksavvy_core::{LocalListing, SerpPage, SiteData, VolumeIndicators};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collaborators::Scraper;
use crate::error::AgentError;
use crate::runner::{ParallelTaskRunner, TaskOutcome};
use crate::scoring::serp_feature_score;

/// One keyword from a batch probe.
#[derive(Debug, Clone)]
pub struct KeywordProbe {
    pub keyword: String,
    pub outcome: TaskOutcome<SerpPage>,
}

impl KeywordProbe {
    #[must_use]
    pub fn indicators(&self) -> Option<&VolumeIndicators> {
        self.outcome
            .as_success()
            .map(|page| &page.search_volume_indicators)
    }
}

#[derive(Clone)]
pub struct ScraperAgent {
    scraper: Arc<dyn Scraper>,
    cache: Arc<dyn CacheStore>,
    runner: ParallelTaskRunner,
    ttl: Duration,
}

impl ScraperAgent {
    #[must_use]
    pub fn new(
        scraper: Arc<dyn Scraper>,
        cache: Arc<dyn CacheStore>,
        runner: ParallelTaskRunner,
        ttl: Duration,
    ) -> Self {
        Self {
            scraper,
            cache,
            runner,
            ttl,
        }
    }

    async fn memoize<T, F, Fut>(&self, key: String, fetch: F) -> Result<T, AgentError>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        if let Some(hit) = get_json::<T>(self.cache.as_ref(), &key).await {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit);
        }
        let value = fetch().await?;
        set_json(self.cache.as_ref(), &key, &value, Some(self.ttl)).await;
        Ok(value)
    }

    /// Result page for `query`, with volume indicators computed on fetch.
    ///
    /// # Errors
    ///
    /// Returns the scraper's [`AgentError`] on a cache miss that fails.
    pub async fn scrape_serp(
        &self,
        query: &str,
        location: Option<&str>,
    ) -> Result<SerpPage, AgentError> {
        self.memoize(keys::serp_key(query, location), || async {
            tracing::info!(query, location, "scraping result page");
            let mut page = self.scraper.scrape_serp(query, location).await?;
            page.search_volume_indicators = serp_feature_score(&page.features());
            Ok(page)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the scraper's [`AgentError`] on a cache miss that fails.
    pub async fn autocomplete(
        &self,
        query: &str,
        location: Option<&str>,
    ) -> Result<Vec<String>, AgentError> {
        self.memoize(keys::autocomplete_key(query, location), || async {
            tracing::info!(query, "fetching autocomplete suggestions");
            self.scraper.autocomplete(query, location).await
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the scraper's [`AgentError`] on a cache miss that fails.
    pub async fn local_competitors(
        &self,
        query: &str,
        location: &str,
    ) -> Result<Vec<LocalListing>, AgentError> {
        self.memoize(keys::local_competitors_key(query, location), || async {
            tracing::info!(query, location, "fetching local listings");
            self.scraper.local_listings(query, location).await
        })
        .await
    }

    /// # Errors
    ///
    /// Returns the scraper's [`AgentError`] on a cache miss that fails.
    pub async fn competitor_site(&self, url: &str) -> Result<SiteData, AgentError> {
        self.memoize(keys::competitor_site_key(url), || async {
            tracing::info!(url, "scraping competitor site");
            self.scraper.scrape_site(url).await
        })
        .await
    }

    /// Probe many keywords concurrently. One entry per keyword, in order.
    pub async fn batch_scrape_keywords(
        &self,
        keywords: &[String],
        location: Option<&str>,
    ) -> Vec<KeywordProbe> {
        let location = location.map(str::to_owned);
        let tasks = keywords.iter().map(|keyword| {
            let agent = self.clone();
            let keyword = keyword.clone();
            let location = location.clone();
            async move { agent.scrape_serp(&keyword, location.as_deref()).await }
        });

        let outcomes = self.runner.run_all(tasks).await;
        keywords
            .iter()
            .zip(outcomes)
            .map(|(keyword, outcome)| {
                if let TaskOutcome::Failure(reason) = &outcome {
                    tracing::warn!(keyword = %keyword, error = %reason, "keyword probe failed");
                }
                KeywordProbe {
                    keyword: keyword.clone(),
                    outcome,
                }
            })
            .collect()
    }
}
