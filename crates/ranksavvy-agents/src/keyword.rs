//! Keyword discovery: autocomplete, result-page probes and AI suggestions.

use std::collections::HashSet;
use std::sync::Arc;

use ranksavvy_core::{
    CompetitionLevel, Intent, KeywordCategory, KeywordDiscoveryResult, KeywordRecord, Location,
};

use crate::collaborators::TextAnalyzer;
use crate::error::AgentError;
use crate::scoring::keyword_value;
use crate::scraper::ScraperAgent;

/// Urgency modifiers combined with the service term.
pub const EMERGENCY_TERMS: [&str; 8] = [
    "emergency",
    "24/7",
    "urgent",
    "same day",
    "now",
    "today",
    "immediate",
    "after hours",
];

/// Commercial-intent modifiers combined with the service term.
pub const INTENT_TERMS: [&str; 10] = [
    "service", "repair", "install", "fix", "replace", "cost", "price", "near me", "best", "top",
];

const PROBES_PER_BATCH: usize = 10;
const RANKED_AUTOCOMPLETE: usize = 5;
const AI_SUGGESTION_VOLUME: u32 = 3;
const MAX_AI_SUGGESTIONS: usize = 10;
const MIN_AI_SUGGESTION_LEN: usize = 10;
const MAX_RELATED_SERVICES: usize = 5;
const MIN_RELATED_SERVICE_LEN: usize = 5;

#[derive(Clone)]
pub struct KeywordAgent {
    scraper: ScraperAgent,
    analyzer: Arc<dyn TextAnalyzer>,
}

impl KeywordAgent {
    #[must_use]
    pub fn new(scraper: ScraperAgent, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self { scraper, analyzer }
    }

    /// Discover and rank keywords for `service` in `location`.
    ///
    /// Autocomplete and AI failures degrade to empty lists.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] if the primary result page cannot be fetched.
    pub async fn discover_keywords(
        &self,
        service: &str,
        location: &str,
        geo: &Location,
    ) -> Result<KeywordDiscoveryResult, AgentError> {
        tracing::info!(service, location, "discovering keywords");

        let autocomplete = match self.scraper.autocomplete(service, Some(location)).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(service, error = %e, "autocomplete failed; continuing without it");
                Vec::new()
            }
        };

        let main_page = self.scraper.scrape_serp(service, Some(location)).await?;

        let emergency_keywords = self
            .probe_variants(emergency_variants(service, location), location)
            .await;
        let intent_keywords = self
            .probe_variants(intent_variants(service, location), location)
            .await;

        let long_tail = self
            .ai_keyword_suggestions(service, location, geo, &autocomplete, &main_page.people_also_ask)
            .await;

        let primary_keyword = format!("{service} {location}");
        let primary = KeywordRecord::new(&primary_keyword, KeywordCategory::Primary, Intent::None)
            .with_volume(
                main_page.search_volume_indicators.score,
                main_page.search_volume_indicators.competition_level,
            );

        let ranked_autocomplete = autocomplete
            .iter()
            .take(RANKED_AUTOCOMPLETE)
            .zip(0_u32..)
            .map(|(suggestion, i)| KeywordRecord {
                popularity_rank: Some(i + 1),
                ..KeywordRecord::new(suggestion, KeywordCategory::Autocomplete, Intent::None)
                    .with_volume(5 - i, CompetitionLevel::Unknown)
            });

        let all_keywords = rank_keywords(
            std::iter::once(primary)
                .chain(ranked_autocomplete)
                .chain(emergency_keywords.iter().cloned())
                .chain(intent_keywords.iter().cloned())
                .chain(long_tail.iter().cloned()),
        );

        Ok(KeywordDiscoveryResult {
            primary_keyword,
            emergency_keywords,
            intent_keywords,
            questions: main_page.people_also_ask,
            long_tail,
            related_searches: main_page.related_searches,
            autocomplete,
            all_keywords,
        })
    }

    /// Probe the first batch of candidates and keep those with any signal.
    async fn probe_variants(&self, candidates: Vec<KeywordRecord>, location: &str) -> Vec<KeywordRecord> {
        let batch: Vec<KeywordRecord> = candidates.into_iter().take(PROBES_PER_BATCH).collect();
        let texts: Vec<String> = batch.iter().map(|k| k.keyword.clone()).collect();
        let probes = self.scraper.batch_scrape_keywords(&texts, Some(location)).await;

        batch
            .into_iter()
            .zip(probes)
            .filter_map(|(record, probe)| {
                let indicators = probe.indicators()?;
                (indicators.score > 0)
                    .then(|| record.with_volume(indicators.score, indicators.competition_level))
            })
            .collect()
    }

    async fn ai_keyword_suggestions(
        &self,
        service: &str,
        location: &str,
        geo: &Location,
        autocomplete: &[String],
        questions: &[String],
    ) -> Vec<KeywordRecord> {
        let nearby: Vec<&str> = geo.nearby_cities.iter().map(|c| c.name.as_str()).collect();
        let nearby_line = if nearby.is_empty() {
            String::new()
        } else {
            format!("Nearby areas also served: {}\n", nearby.join(", "))
        };
        let prompt = format!(
            "Analyze these search patterns for {service} in {location} and suggest high-value keywords:\n\n\
             Autocomplete suggestions: {}\n\
             Questions people ask: {}\n\
             {nearby_line}\n\
             Based on these patterns, suggest 10 high-commercial-intent long-tail keywords that:\n\
             1. Include emotional triggers (worried, concerned, need help)\n\
             2. Include pain points specific to this service\n\
             3. Include solution-focused terms\n\
             4. Are specific to local searches\n\n\
             Format: Return only the keywords, one per line.",
            first_n(autocomplete, 5),
            first_n(questions, 5),
        );

        match self.analyzer.complete(&prompt, 1000).await {
            Ok(reply) => reply
                .lines()
                .map(str::trim)
                .filter(|line| line.len() > MIN_AI_SUGGESTION_LEN)
                .take(MAX_AI_SUGGESTIONS)
                .map(|line| {
                    KeywordRecord::new(line, KeywordCategory::AiSuggested, Intent::Commercial)
                        .with_volume(AI_SUGGESTION_VOLUME, CompetitionLevel::Unknown)
                })
                .collect(),
            Err(e) => {
                tracing::warn!(service, error = %e, "AI keyword suggestions unavailable");
                Vec::new()
            }
        }
    }

    /// Services a business offering `base_service` would plausibly also sell.
    pub async fn find_related_services(&self, base_service: &str) -> Vec<String> {
        let prompt = format!(
            "For the service \"{base_service}\", list 5 closely related services that:\n\
             1. The same type of business might offer\n\
             2. Customers often need at the same time\n\
             3. Are logical extensions of the main service\n\n\
             Example: If the service is \"HVAC repair\", related might be \"furnace maintenance\", \"AC installation\", etc.\n\n\
             Return only the service names, one per line."
        );

        match self.analyzer.complete(&prompt, 1000).await {
            Ok(reply) => reply
                .lines()
                .map(str::trim)
                .filter(|line| line.len() > MIN_RELATED_SERVICE_LEN)
                .take(MAX_RELATED_SERVICES)
                .map(str::to_owned)
                .collect(),
            Err(e) => {
                tracing::warn!(base_service, error = %e, "related services unavailable");
                Vec::new()
            }
        }
    }
}

/// Emergency candidates: each term in prefix then suffix position.
#[must_use]
pub fn emergency_variants(service: &str, location: &str) -> Vec<KeywordRecord> {
    EMERGENCY_TERMS
        .iter()
        .flat_map(|term| {
            [
                format!("{term} {service} {location}"),
                format!("{service} {term} {location}"),
            ]
        })
        .map(|keyword| KeywordRecord::new(keyword, KeywordCategory::Emergency, Intent::Urgent))
        .collect()
}

/// Commercial candidates: each term in suffix then prefix position.
#[must_use]
pub fn intent_variants(service: &str, location: &str) -> Vec<KeywordRecord> {
    INTENT_TERMS
        .iter()
        .flat_map(|term| {
            [
                format!("{service} {term} {location}"),
                format!("{term} {service} {location}"),
            ]
        })
        .map(|keyword| KeywordRecord::new(keyword, KeywordCategory::Commercial, Intent::Commercial))
        .collect()
}

/// Drop repeated keywords (first occurrence wins, case-insensitive) and
/// order by [`keyword_value`], highest first. Ties keep input order.
#[must_use]
pub fn rank_keywords(records: impl IntoIterator<Item = KeywordRecord>) -> Vec<KeywordRecord> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<KeywordRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.keyword.trim().to_lowercase()))
        .collect();
    ranked.sort_by_key(|record| std::cmp::Reverse(keyword_value(record)));
    ranked
}

fn first_n(items: &[String], n: usize) -> String {
    items.iter().take(n).map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_variants_cover_both_orders() {
        let variants = emergency_variants("HVAC repair", "Pelham Alabama");
        assert_eq!(variants.len(), 16);
        assert_eq!(variants[0].keyword, "emergency HVAC repair Pelham Alabama");
        assert_eq!(variants[1].keyword, "HVAC repair emergency Pelham Alabama");
        assert!(variants
            .iter()
            .all(|v| v.category == KeywordCategory::Emergency && v.intent == Intent::Urgent));
    }

    #[test]
    fn intent_variants_start_with_suffix_form() {
        let variants = intent_variants("plumber", "Austin TX");
        assert_eq!(variants.len(), 20);
        assert_eq!(variants[0].keyword, "plumber service Austin TX");
        assert_eq!(variants[1].keyword, "service plumber Austin TX");
        assert_eq!(variants[15].keyword, "near me plumber Austin TX");
    }

    #[test]
    fn rank_keywords_dedupes_case_insensitively_and_sorts_by_value() {
        let ranked = rank_keywords(vec![
            KeywordRecord::new("hvac repair pelham", KeywordCategory::Primary, Intent::None)
                .with_volume(2, CompetitionLevel::High),
            KeywordRecord::new("HVAC Repair Pelham", KeywordCategory::Autocomplete, Intent::None)
                .with_volume(5, CompetitionLevel::Low),
            KeywordRecord::new("emergency hvac", KeywordCategory::Emergency, Intent::Urgent)
                .with_volume(3, CompetitionLevel::Low),
        ]);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].keyword, "emergency hvac");
        assert_eq!(ranked[1].category, KeywordCategory::Primary);
    }

    #[test]
    fn first_n_joins_with_commas() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(first_n(&items, 2), "a, b");
        assert_eq!(first_n(&[], 5), "");
    }
}
