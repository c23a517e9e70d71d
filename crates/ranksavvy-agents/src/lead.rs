//! The end-to-end niche analysis pipeline.
//!
//! Steps run in order: geography, keywords, competitors, opportunities,
//! recommendations and the optional surprise pass. The finished report is
//! cached as a unit; a failed step leaves its error on the partial report.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use ranksavvy_cache::{get_json, keys, set_json, CacheStore, DEFAULT_TTL};
use ranksavvy_core::{
    AnalysisOptions, AnalysisResult, AppConfig, CompetitionLevel, CompetitorEntry,
    CompetitorRecord, CompetitorSet, Intent, KeywordDiscoveryResult, KeywordRecord, Location,
    OpportunitySet, Priority, Recommendation, Recommendations, SurpriseOpportunity,
};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::collaborators::Collaborators;
use crate::competitor::{analyze_competitor_keywords, find_content_gaps, CompetitorAgent};
use crate::error::AgentError;
use crate::geo::GeoAgent;
use crate::keyword::KeywordAgent;
use crate::runner::{successes, ParallelTaskRunner};
use crate::scraper::ScraperAgent;

const MAX_LOCAL_COMPETITORS: usize = 5;
const MAX_ORGANIC_COMPETITORS: usize = 5;
const MAX_LOW_COMPETITION: usize = 10;
const MAX_SURPRISE_SERVICES: usize = 5;
const EMERGENCY_CTA_KEYWORDS: usize = 5;
const FAQ_QUESTIONS: usize = 10;
const LOCAL_PACK_TARGET: usize = 3;
const UNDERSERVED_MAX_ADS: usize = 2;
const UNDERSERVED_MAX_LOCAL_PACK: usize = 3;
const UNDERSERVED_SCORE: u32 = 9;

/// Substrings that mark a keyword as emergency-sounding.
const URGENCY_MARKERS: [&str; 5] = ["emergency", "24/7", "urgent", "now", "today"];

/// Tunables for the agent graph, usually taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSettings {
    pub cache_ttl: Duration,
    pub max_concurrent_lookups: usize,
    pub region_clusters_validated: bool,
}

impl AgentSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            max_concurrent_lookups: config.max_concurrent_lookups,
            region_clusters_validated: config.region_clusters_validated,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            max_concurrent_lookups: 10,
            region_clusters_validated: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Geographic,
    Keywords,
    Competitors,
    Opportunities,
    Recommendations,
    Surprise,
}

/// Progress events for streaming callers, serialized with a `status` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisProgress {
    Started {
        message: String,
    },
    Processing {
        step: PipelineStep,
        message: String,
    },
    Completed {
        results: Box<AnalysisResult>,
    },
    Error {
        error: String,
    },
}

type Progress<'a> = Option<&'a UnboundedSender<AnalysisProgress>>;

fn emit(progress: Progress<'_>, event: AnalysisProgress) {
    if let Some(tx) = progress {
        if tx.send(event).is_err() {
            tracing::debug!("progress receiver dropped");
        }
    }
}

fn step(progress: Progress<'_>, step: PipelineStep, message: &str) {
    tracing::info!(?step, "{message}");
    emit(
        progress,
        AnalysisProgress::Processing {
            step,
            message: message.to_string(),
        },
    );
}

#[derive(Clone)]
pub struct LeadAgent {
    cache: Arc<dyn CacheStore>,
    runner: ParallelTaskRunner,
    scraper: ScraperAgent,
    geo: GeoAgent,
    keywords: KeywordAgent,
    competitors: CompetitorAgent,
    ttl: Duration,
}

impl LeadAgent {
    #[must_use]
    pub fn new(
        collaborators: Collaborators,
        cache: Arc<dyn CacheStore>,
        settings: AgentSettings,
    ) -> Self {
        let runner = ParallelTaskRunner::new(settings.max_concurrent_lookups);
        let scraper = ScraperAgent::new(
            collaborators.scraper,
            Arc::clone(&cache),
            runner.clone(),
            settings.cache_ttl,
        );
        let geo = GeoAgent::new(collaborators.geo, settings.region_clusters_validated);
        let keywords = KeywordAgent::new(scraper.clone(), Arc::clone(&collaborators.analyzer));
        let competitors = CompetitorAgent::new(scraper.clone(), collaborators.analyzer);

        Self {
            cache,
            runner,
            scraper,
            geo,
            keywords,
            competitors,
            ttl: settings.cache_ttl,
        }
    }

    #[must_use]
    pub fn scraper(&self) -> &ScraperAgent {
        &self.scraper
    }

    #[must_use]
    pub fn geo(&self) -> &GeoAgent {
        &self.geo
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub async fn analyze_niche(
        &self,
        query: &str,
        location: &str,
        options: AnalysisOptions,
    ) -> AnalysisResult {
        self.analyze_niche_with_progress(query, location, options, None)
            .await
    }

    /// Run the pipeline, reporting each step on `progress` when given.
    ///
    /// A cached report is returned verbatim. A step failure never escapes:
    /// it is stored in [`AnalysisResult::error`] and the partial report is
    /// returned uncached.
    pub async fn analyze_niche_with_progress(
        &self,
        query: &str,
        location: &str,
        options: AnalysisOptions,
        progress: Progress<'_>,
    ) -> AnalysisResult {
        emit(
            progress,
            AnalysisProgress::Started {
                message: format!("Starting analysis for {query} in {location}"),
            },
        );

        let key = keys::niche_analysis_key(query, location, options.radius);
        if let Some(cached) = get_json::<AnalysisResult>(self.cache.as_ref(), &key).await {
            tracing::info!(key = %key, "returning cached analysis");
            emit(
                progress,
                AnalysisProgress::Completed {
                    results: Box::new(cached.clone()),
                },
            );
            return cached;
        }

        let mut result = AnalysisResult::new(query, location);
        match self.run_pipeline(&mut result, options, progress).await {
            Ok(()) => {
                set_json(self.cache.as_ref(), &key, &result, Some(self.ttl)).await;
                emit(
                    progress,
                    AnalysisProgress::Completed {
                        results: Box::new(result.clone()),
                    },
                );
            }
            Err(e) => {
                tracing::error!(query, location, error = %e, "niche analysis failed");
                result.error = Some(e.to_string());
                emit(
                    progress,
                    AnalysisProgress::Error {
                        error: e.to_string(),
                    },
                );
            }
        }
        result
    }

    async fn run_pipeline(
        &self,
        result: &mut AnalysisResult,
        options: AnalysisOptions,
        progress: Progress<'_>,
    ) -> Result<(), AgentError> {
        let query = result.query.clone();
        let location = result.location.clone();

        step(progress, PipelineStep::Geographic, "Analyzing geographic data...");
        result.geographic_data = self.geo.analyze_location(&location, options.radius).await;

        step(progress, PipelineStep::Keywords, "Discovering keywords...");
        result.keywords = self
            .keywords
            .discover_keywords(&query, &location, &result.geographic_data)
            .await?;

        step(progress, PipelineStep::Competitors, "Analyzing competitors...");
        result.competitors = self.gather_competitors(&query, &location).await?;

        step(progress, PipelineStep::Opportunities, "Identifying opportunities...");
        result.opportunities =
            find_opportunities(&result.keywords, &result.competitors.detailed_analysis);

        step(progress, PipelineStep::Recommendations, "Generating recommendations...");
        result.recommendations = generate_recommendations(
            &result.keywords,
            &result.opportunities,
            result.competitors.local.len(),
        );

        if options.surprise_me {
            step(progress, PipelineStep::Surprise, "Finding surprise opportunities...");
            result.surprise_opportunities =
                Some(self.find_surprises(&query, &result.geographic_data).await);
        }

        Ok(())
    }

    async fn gather_competitors(
        &self,
        query: &str,
        location: &str,
    ) -> Result<CompetitorSet, AgentError> {
        let local = self.scraper.local_competitors(query, location).await?;
        let page = self.scraper.scrape_serp(query, Some(location)).await?;
        let organic: Vec<_> = page
            .organic_results
            .into_iter()
            .take(MAX_ORGANIC_COMPETITORS)
            .collect();

        let entries: Vec<CompetitorEntry> = local
            .iter()
            .take(MAX_LOCAL_COMPETITORS)
            .map(CompetitorEntry::from)
            .chain(organic.iter().filter(|r| r.url.is_some()).map(|r| CompetitorEntry {
                name: r.title.clone(),
                url: r.url.clone(),
                ..CompetitorEntry::default()
            }))
            .collect();

        let tasks = entries.into_iter().map(|entry| {
            let agent = self.competitors.clone();
            async move { Ok::<_, Infallible>(agent.analyze_competitor(&entry).await) }
        });
        let detailed_analysis: Vec<CompetitorRecord> = successes(self.runner.run_all(tasks).await);
        let keyword_landscape = analyze_competitor_keywords(&detailed_analysis);

        Ok(CompetitorSet {
            local,
            organic,
            detailed_analysis,
            keyword_landscape,
        })
    }

    async fn find_surprises(&self, service: &str, geo: &Location) -> Vec<SurpriseOpportunity> {
        let mut related = self.keywords.find_related_services(service).await;
        related.truncate(MAX_SURPRISE_SERVICES);
        if related.is_empty() {
            return Vec::new();
        }

        let location =
            GeoAgent::format_location_for_search(&geo.primary_location, geo.state.as_deref());
        self.scraper
            .batch_scrape_keywords(&related, Some(&location))
            .await
            .into_iter()
            .filter_map(|probe| {
                let page = probe.outcome.as_success()?;
                (page.ads.len() < UNDERSERVED_MAX_ADS
                    && page.local_pack.len() < UNDERSERVED_MAX_LOCAL_PACK)
                    .then(|| SurpriseOpportunity {
                        keyword: probe.keyword.clone(),
                        opportunity_score: UNDERSERVED_SCORE,
                        reason: "Underserved market with low competition".to_string(),
                    })
            })
            .collect()
    }
}

/// Derive keyword and content opportunities from one run's findings.
#[must_use]
pub fn find_opportunities(
    keywords: &KeywordDiscoveryResult,
    competitors: &[CompetitorRecord],
) -> OpportunitySet {
    let competitor_keywords: std::collections::HashSet<String> = competitors
        .iter()
        .flat_map(|c| c.keywords.iter())
        .map(|k| k.to_lowercase())
        .collect();

    let keyword_gaps = keywords
        .all_keywords
        .iter()
        .filter(|k| k.intent == Intent::Commercial)
        .filter(|k| !competitor_keywords.contains(&k.keyword.to_lowercase()))
        .cloned()
        .collect();

    let emergency_keywords = keywords
        .all_keywords
        .iter()
        .filter(|k| is_urgent(&k.keyword) && k.competition != CompetitionLevel::High)
        .cloned()
        .collect();

    let mut low_competition: Vec<KeywordRecord> = keywords
        .all_keywords
        .iter()
        .filter(|k| k.competition == CompetitionLevel::Low)
        .cloned()
        .collect();
    low_competition.sort_by_key(|k| std::cmp::Reverse(k.search_volume_score));
    low_competition.truncate(MAX_LOW_COMPETITION);

    OpportunitySet {
        keyword_gaps,
        emergency_keywords,
        low_competition,
        content_gaps: find_content_gaps(competitors),
    }
}

fn is_urgent(keyword: &str) -> bool {
    let lower = keyword.to_lowercase();
    URGENCY_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[must_use]
pub fn generate_recommendations(
    keywords: &KeywordDiscoveryResult,
    opportunities: &OpportunitySet,
    local_competitor_count: usize,
) -> Recommendations {
    let mut recommendations = Recommendations::default();

    if !opportunities.emergency_keywords.is_empty() {
        recommendations.immediate_actions.push(Recommendation {
            keywords: opportunities
                .emergency_keywords
                .iter()
                .take(EMERGENCY_CTA_KEYWORDS)
                .map(|k| k.keyword.clone())
                .collect(),
            ..Recommendation::new(
                "Target emergency keywords",
                Priority::High,
                "High-intent searches with lower competition",
            )
        });
    }

    if !keywords.questions.is_empty() {
        recommendations.content_strategy.push(Recommendation {
            questions: keywords.questions.iter().take(FAQ_QUESTIONS).cloned().collect(),
            ..Recommendation::new(
                "Create FAQ content",
                Priority::Medium,
                "Address common customer questions",
            )
        });
    }

    if local_competitor_count < LOCAL_PACK_TARGET {
        recommendations.local_seo.push(Recommendation::new(
            "Optimize for local pack",
            Priority::High,
            format!(
                "Only {local_competitor_count} businesses in local pack - opportunity to rank"
            ),
        ));
    }

    recommendations
}
