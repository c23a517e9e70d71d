//! Result-page data as returned by the scraper, plus the derived volume
//! indicators.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganicResult {
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdResult {
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalPackEntry {
    pub name: String,
    pub position: u32,
}

/// One scraped search-engine results page.
///
/// `search_volume_indicators` is derived from the other fields whenever the
/// page is fetched fresh; it is stored alongside the page in the cache and
/// never on its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SerpPage {
    pub organic_results: Vec<OrganicResult>,
    pub ads: Vec<AdResult>,
    pub local_pack: Vec<LocalPackEntry>,
    pub people_also_ask: Vec<String>,
    pub related_searches: Vec<String>,
    pub people_also_search_for: Vec<String>,
    pub featured_snippet: Option<serde_json::Value>,
    pub knowledge_panel: Option<serde_json::Value>,
    pub search_volume_indicators: VolumeIndicators,
}

impl SerpPage {
    /// Reduce the page to the counts and flags the scorer looks at.
    #[must_use]
    pub fn features(&self) -> SerpFeatureSet {
        SerpFeatureSet {
            ad_count: self.ads.len(),
            organic_count: self.organic_results.len(),
            local_pack_size: self.local_pack.len(),
            people_also_ask: self.people_also_ask.len(),
            related_searches: self.related_searches.len(),
            featured_snippet: is_present(self.featured_snippet.as_ref()),
            knowledge_panel: is_present(self.knowledge_panel.as_ref()),
        }
    }
}

/// Scrapers report an absent feature as `null`, `false`, `0`, `""`, `{}`
/// or `[]`.
fn is_present(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v.abs() > 0.0),
    }
}

/// Raw counts and presence flags for one result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerpFeatureSet {
    pub ad_count: usize,
    pub organic_count: usize,
    /// Zero means no local pack was shown.
    pub local_pack_size: usize,
    pub people_also_ask: usize,
    pub related_searches: usize,
    pub featured_snippet: bool,
    pub knowledge_panel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VolumeEstimate {
    #[serde(rename = "low-medium")]
    LowMedium,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "high")]
    High,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

/// How crowded a keyword is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl CompetitionLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CompetitionLevel::Low => "low",
            CompetitionLevel::Medium => "medium",
            CompetitionLevel::High => "high",
            CompetitionLevel::Unknown => "unknown",
        }
    }
}

/// Volume and competition estimate derived from a [`SerpFeatureSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeIndicators {
    pub estimated_volume: VolumeEstimate,
    pub competition_level: CompetitionLevel,
    pub commercial_intent: bool,
    pub local_intent: bool,
    pub informational_intent: bool,
    pub score: u32,
}
