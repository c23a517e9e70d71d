use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A business listing from the local/maps results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalListing {
    pub name: String,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalLink {
    pub url: String,
    pub anchor_text: String,
}

/// On-page SEO features scraped from a competitor site.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteData {
    pub url: String,
    pub title: Option<String>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub meta_description: Option<String>,
    pub schema_types: Vec<String>,
    pub internal_links: Vec<InternalLink>,
    /// Alt text per image, empty string when the image has none.
    pub images_alt_text: Vec<String>,
}

impl SiteData {
    #[must_use]
    pub fn has_meta_description(&self) -> bool {
        self.meta_description
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty())
    }

    #[must_use]
    pub fn images_with_alt_text(&self) -> usize {
        self.images_alt_text
            .iter()
            .filter(|alt| !alt.trim().is_empty())
            .count()
    }
}

/// What the text analyzer extracted from a competitor's headings and meta.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentAnalysis {
    pub keywords: Vec<String>,
    pub service_focus: Vec<String>,
    pub value_propositions: Vec<String>,
    pub content_gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStrategy {
    pub service_focus: Vec<String>,
    pub value_propositions: Vec<String>,
    pub content_gaps: Vec<String>,
}

impl From<&ContentAnalysis> for ContentStrategy {
    fn from(analysis: &ContentAnalysis) -> Self {
        Self {
            service_focus: analysis.service_focus.clone(),
            value_propositions: analysis.value_propositions.clone(),
            content_gaps: analysis.content_gaps.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitorType {
    Local,
    #[default]
    Organic,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalData {
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub category: Option<String>,
}

/// A competitor to analyse, taken from either the local pack or organic results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorEntry {
    pub name: String,
    pub url: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<u32>,
    pub category: Option<String>,
    pub website: Option<String>,
}

impl From<&LocalListing> for CompetitorEntry {
    fn from(listing: &LocalListing) -> Self {
        Self {
            name: listing.name.clone(),
            url: None,
            rating: listing.rating,
            reviews_count: listing.reviews_count,
            category: listing.category.clone(),
            website: listing.website.clone(),
        }
    }
}

/// The analysed view of one competitor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorRecord {
    pub name: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub competitor_type: CompetitorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_data: Option<LocalData>,
    pub seo_data: Option<SiteData>,
    pub keywords: Vec<String>,
    pub content_strategy: ContentStrategy,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Keyword overlap across all analysed competitors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordLandscape {
    /// Keywords used by three or more competitors, with their usage count.
    pub common_keywords: BTreeMap<String, usize>,
    /// Keywords used by exactly one competitor.
    pub unique_keywords: Vec<String>,
}

/// Competitor sets gathered for one analysis run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorSet {
    pub local: Vec<LocalListing>,
    pub organic: Vec<crate::serp::OrganicResult>,
    pub detailed_analysis: Vec<CompetitorRecord>,
    pub keyword_landscape: KeywordLandscape,
}
