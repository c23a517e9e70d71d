//! Per-competitor site analysis and cross-competitor comparisons.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use ranksavvy_core::{
    CompetitorEntry, CompetitorRecord, CompetitorType, ContentAnalysis, ContentGap,
    ContentGapKind, ContentStrategy, KeywordLandscape, LocalData, Priority, SiteData,
};

use crate::collaborators::TextAnalyzer;
use crate::scraper::ScraperAgent;

/// Topics customers expect from any local-service site.
pub const INDUSTRY_STANDARD_TOPICS: [&str; 10] = [
    "emergency service availability",
    "pricing transparency",
    "service guarantees",
    "local expertise",
    "response time commitments",
    "certification and licensing",
    "insurance and bonding",
    "customer testimonials",
    "before/after galleries",
    "service area maps",
];

const CONTENT_MAX_TOKENS: u32 = 1500;
const MIN_H2_SECTIONS: usize = 5;
const MIN_VALUE_PROPOSITIONS: usize = 3;
const MIN_SERVICE_FOCUS: usize = 5;
const MIN_IMAGES_WITH_ALT: usize = 5;
const MAX_CONTENT_GAPS: usize = 3;
const COMMON_KEYWORD_MIN_COMPETITORS: usize = 3;

#[derive(Clone)]
pub struct CompetitorAgent {
    scraper: ScraperAgent,
    analyzer: Arc<dyn TextAnalyzer>,
}

impl CompetitorAgent {
    #[must_use]
    pub fn new(scraper: ScraperAgent, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self { scraper, analyzer }
    }

    /// Scrape and judge one competitor. Never fails: a scrape problem is
    /// recorded in [`CompetitorRecord::error`] alongside the listing data.
    pub async fn analyze_competitor(&self, entry: &CompetitorEntry) -> CompetitorRecord {
        let mut record = CompetitorRecord {
            name: entry.name.clone(),
            url: entry.url.clone(),
            ..CompetitorRecord::default()
        };

        if entry.rating.is_some() {
            record.competitor_type = CompetitorType::Local;
            record.local_data = Some(LocalData {
                rating: entry.rating,
                reviews_count: entry.reviews_count,
                category: entry.category.clone(),
            });
            if entry.website.is_some() {
                record.url.clone_from(&entry.website);
            }
        }

        let Some(url) = record.url.clone() else {
            return record;
        };

        let site = match self.scraper.competitor_site(&url).await {
            Ok(site) => site,
            Err(e) => {
                tracing::warn!(competitor = %record.name, url = %url, error = %e, "competitor scrape failed");
                record.error = Some(e.to_string());
                return record;
            }
        };

        let analysis = self.analyze_content(&site).await;
        record.keywords.clone_from(&analysis.keywords);
        record.content_strategy = ContentStrategy::from(&analysis);
        record.strengths = identify_strengths(&site, &analysis);
        record.weaknesses = identify_weaknesses(&site, &analysis);
        record.seo_data = Some(site);
        record
    }

    /// Ask the text analyzer what a site targets. Unparseable or failed
    /// replies yield an empty analysis.
    pub async fn analyze_content(&self, site: &SiteData) -> ContentAnalysis {
        let h1: Vec<&str> = site.h1_tags.iter().take(5).map(String::as_str).collect();
        let h2: Vec<&str> = site.h2_tags.iter().take(10).map(String::as_str).collect();
        let prompt = format!(
            "Analyze this competitor's website content and extract:\n\
             1. Main keywords they're targeting\n\
             2. Service focus areas\n\
             3. Unique value propositions\n\
             4. Content gaps or weaknesses\n\n\
             H1 Tags: {}\n\
             H2 Tags: {}\n\
             Meta Description: {}\n\n\
             Return as JSON with keys: keywords, service_focus, value_propositions, content_gaps",
            h1.join(", "),
            h2.join(", "),
            site.meta_description.as_deref().unwrap_or(""),
        );

        let reply = match self.analyzer.complete(&prompt, CONTENT_MAX_TOKENS).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(url = %site.url, error = %e, "content analysis unavailable");
                return ContentAnalysis::default();
            }
        };

        match serde_json::from_str(strip_code_fence(&reply)) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(url = %site.url, error = %e, "content analysis reply was not valid JSON");
                ContentAnalysis::default()
            }
        }
    }
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[must_use]
pub fn identify_strengths(site: &SiteData, analysis: &ContentAnalysis) -> Vec<String> {
    let mut strengths = Vec::new();
    if !site.h1_tags.is_empty() {
        strengths.push("Clear H1 structure".to_string());
    }
    if site.h2_tags.len() >= MIN_H2_SECTIONS {
        strengths.push("Comprehensive content structure".to_string());
    }
    if site.has_meta_description() {
        strengths.push("Optimized meta descriptions".to_string());
    }
    if !site.schema_types.is_empty() {
        strengths.push(format!("Schema markup: {}", site.schema_types.join(", ")));
    }
    if analysis.value_propositions.len() >= MIN_VALUE_PROPOSITIONS {
        strengths.push("Clear value propositions".to_string());
    }
    if analysis.service_focus.len() >= MIN_SERVICE_FOCUS {
        strengths.push("Comprehensive service coverage".to_string());
    }
    strengths
}

#[must_use]
pub fn identify_weaknesses(site: &SiteData, analysis: &ContentAnalysis) -> Vec<String> {
    let checks = [
        (site.h1_tags.is_empty(), "Missing H1 tags"),
        (site.h2_tags.len() < MIN_H2_SECTIONS, "Limited content depth"),
        (!site.has_meta_description(), "No meta description"),
        (site.schema_types.is_empty(), "No schema markup"),
        (
            analysis.value_propositions.len() < MIN_VALUE_PROPOSITIONS,
            "Unclear value proposition",
        ),
        (
            analysis.service_focus.len() < MIN_SERVICE_FOCUS,
            "Narrow service coverage",
        ),
        (
            analysis.content_gaps.len() > MAX_CONTENT_GAPS,
            "Multiple content gaps",
        ),
        (
            site.images_with_alt_text() < MIN_IMAGES_WITH_ALT,
            "Poor image optimization",
        ),
    ];
    checks
        .into_iter()
        .filter(|(failed, _)| *failed)
        .map(|(_, weakness)| weakness.to_string())
        .collect()
}

/// Count how many competitors use each extracted keyword.
#[must_use]
pub fn analyze_competitor_keywords(competitors: &[CompetitorRecord]) -> KeywordLandscape {
    let mut usage: BTreeMap<String, usize> = BTreeMap::new();
    for competitor in competitors {
        let distinct: HashSet<&str> = competitor.keywords.iter().map(String::as_str).collect();
        for keyword in distinct {
            *usage.entry(keyword.to_string()).or_default() += 1;
        }
    }

    let unique_keywords = usage
        .iter()
        .filter(|(_, count)| **count == 1)
        .map(|(keyword, _)| keyword.clone())
        .collect();
    usage.retain(|_, count| *count >= COMMON_KEYWORD_MIN_COMPETITORS);

    KeywordLandscape {
        common_keywords: usage,
        unique_keywords,
    }
}

/// Analyzer-reported gaps, then standard topics no competitor has an H2 for.
#[must_use]
pub fn find_content_gaps(competitors: &[CompetitorRecord]) -> Vec<ContentGap> {
    let mut gaps: Vec<ContentGap> = competitors
        .iter()
        .flat_map(|c| c.content_strategy.content_gaps.iter())
        .map(|gap| ContentGap {
            gap: gap.clone(),
            kind: ContentGapKind::MissingContent,
            priority: None,
        })
        .collect();

    let headings: Vec<String> = competitors
        .iter()
        .filter_map(|c| c.seo_data.as_ref())
        .flat_map(|site| site.h2_tags.iter())
        .map(|h2| h2.to_lowercase())
        .collect();

    gaps.extend(
        INDUSTRY_STANDARD_TOPICS
            .iter()
            .filter(|topic| !headings.iter().any(|h2| h2.contains(*topic)))
            .map(|topic| ContentGap {
                gap: (*topic).to_string(),
                kind: ContentGapKind::IndustryStandard,
                priority: Some(Priority::High),
            }),
    );
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_site() -> SiteData {
        SiteData {
            url: "https://acme-hvac.example".to_string(),
            h1_tags: vec!["Acme HVAC".to_string()],
            h2_tags: (1..=6).map(|i| format!("Section {i}")).collect(),
            meta_description: Some("Fast, local HVAC repair.".to_string()),
            schema_types: vec!["LocalBusiness".to_string(), "Service".to_string()],
            images_alt_text: (1..=5).map(|i| format!("photo {i}")).collect(),
            ..SiteData::default()
        }
    }

    fn rich_analysis() -> ContentAnalysis {
        ContentAnalysis {
            keywords: vec!["hvac repair".to_string()],
            service_focus: (1..=5).map(|i| format!("service {i}")).collect(),
            value_propositions: (1..=3).map(|i| format!("value {i}")).collect(),
            content_gaps: Vec::new(),
        }
    }

    #[test]
    fn strong_site_has_every_strength_and_no_weakness() {
        let strengths = identify_strengths(&strong_site(), &rich_analysis());
        assert_eq!(strengths.len(), 6);
        assert!(strengths.contains(&"Schema markup: LocalBusiness, Service".to_string()));
        assert!(identify_weaknesses(&strong_site(), &rich_analysis()).is_empty());
    }

    #[test]
    fn bare_site_has_every_weakness() {
        let analysis = ContentAnalysis {
            content_gaps: (1..=4).map(|i| format!("gap {i}")).collect(),
            ..ContentAnalysis::default()
        };
        let weaknesses = identify_weaknesses(&SiteData::default(), &analysis);
        assert_eq!(weaknesses.len(), 8);
        assert_eq!(weaknesses[0], "Missing H1 tags");
        assert_eq!(weaknesses[7], "Poor image optimization");
        assert!(identify_strengths(&SiteData::default(), &analysis).is_empty());
    }

    #[test]
    fn blank_meta_description_counts_as_missing() {
        let site = SiteData {
            meta_description: Some("   ".to_string()),
            ..strong_site()
        };
        let weaknesses = identify_weaknesses(&site, &rich_analysis());
        assert_eq!(weaknesses, vec!["No meta description".to_string()]);
    }

    #[test]
    fn keyword_landscape_splits_common_and_unique() {
        let with_keywords = |keywords: &[&str]| CompetitorRecord {
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            ..CompetitorRecord::default()
        };
        let competitors = vec![
            with_keywords(&["ac repair", "furnace", "ac repair"]),
            with_keywords(&["ac repair", "duct cleaning"]),
            with_keywords(&["ac repair", "furnace"]),
        ];

        let landscape = analyze_competitor_keywords(&competitors);
        assert_eq!(landscape.common_keywords.get("ac repair"), Some(&3));
        assert!(!landscape.common_keywords.contains_key("furnace"));
        assert_eq!(landscape.unique_keywords, vec!["duct cleaning".to_string()]);
    }

    #[test]
    fn content_gaps_skip_topics_covered_by_any_heading() {
        let covered = CompetitorRecord {
            seo_data: Some(SiteData {
                h2_tags: vec![
                    "Our Pricing Transparency Promise".to_string(),
                    "Customer Testimonials".to_string(),
                ],
                ..SiteData::default()
            }),
            content_strategy: ContentStrategy {
                content_gaps: vec!["No financing info".to_string()],
                ..ContentStrategy::default()
            },
            ..CompetitorRecord::default()
        };

        let gaps = find_content_gaps(&[covered]);
        assert_eq!(gaps.len(), 9);
        assert_eq!(gaps[0].kind, ContentGapKind::MissingContent);
        assert_eq!(gaps[0].gap, "No financing info");
        assert!(gaps[1..]
            .iter()
            .all(|g| g.kind == ContentGapKind::IndustryStandard && g.priority == Some(Priority::High)));
        assert!(!gaps.iter().any(|g| g.gap == "pricing transparency"));
    }

    #[test]
    fn strip_code_fence_handles_tagged_and_bare_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }
}
