use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::competitor::CompetitorSet;
use crate::keyword::{KeywordDiscoveryResult, KeywordRecord};
use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentGapKind {
    MissingContent,
    IndustryStandard,
}

/// A topic no competitor covers well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGap {
    pub gap: String,
    #[serde(rename = "type")]
    pub kind: ContentGapKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Findings derived from keywords and competitors once per run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunitySet {
    /// Commercial keywords that no competitor targets.
    pub keyword_gaps: Vec<KeywordRecord>,
    /// Emergency keywords whose competition is not high.
    pub emergency_keywords: Vec<KeywordRecord>,
    /// Low-competition keywords, highest volume first, at most ten.
    pub low_competition: Vec<KeywordRecord>,
    pub content_gaps: Vec<ContentGap>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub priority: Priority,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<String>,
}

impl Recommendation {
    #[must_use]
    pub fn new(action: impl Into<String>, priority: Priority, reason: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            priority,
            reason: reason.into(),
            keywords: Vec::new(),
            questions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub immediate_actions: Vec<Recommendation>,
    pub content_strategy: Vec<Recommendation>,
    pub technical_seo: Vec<Recommendation>,
    pub local_seo: Vec<Recommendation>,
}

/// A related service whose result page looks underserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurpriseOpportunity {
    pub keyword: String,
    pub opportunity_score: u32,
    pub reason: String,
}

/// Caller options for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub radius: Option<f64>,
    pub surprise_me: bool,
}

/// The full niche report, cached as a unit under the run's composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub query: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub geographic_data: Location,
    pub keywords: KeywordDiscoveryResult,
    pub competitors: CompetitorSet,
    pub opportunities: OpportunitySet,
    pub recommendations: Recommendations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surprise_opportunities: Option<Vec<SurpriseOpportunity>>,
    /// Set when a pipeline step failed; the other sections hold whatever was
    /// gathered before the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            query: String::new(),
            location: String::new(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            geographic_data: Location::default(),
            keywords: KeywordDiscoveryResult::default(),
            competitors: CompetitorSet::default(),
            opportunities: OpportunitySet::default(),
            recommendations: Recommendations::default(),
            surprise_opportunities: None,
            error: None,
        }
    }
}

impl AnalysisResult {
    #[must_use]
    pub fn new(query: &str, location: &str) -> Self {
        Self {
            query: query.to_string(),
            location: location.to_string(),
            timestamp: Utc::now(),
            geographic_data: Location::unresolved(location),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommendation_omits_empty_lists() {
        let rec = Recommendation::new(
            "Optimize for local pack",
            Priority::High,
            "Only 2 businesses in local pack - opportunity to rank",
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["priority"], "high");
        assert!(json.get("keywords").is_none());
        assert!(json.get("questions").is_none());
    }

    #[test]
    fn analysis_options_default_when_fields_missing() {
        let opts: AnalysisOptions = serde_json::from_str("{}").unwrap();
        assert!(opts.radius.is_none());
        assert!(!opts.surprise_me);
    }

    #[test]
    fn analysis_result_survives_json_round_trip() {
        let mut result = AnalysisResult::new("HVAC repair", "Pelham Alabama");
        result.keywords.primary_keyword = "HVAC repair Pelham Alabama".to_string();
        result.error = Some("competitor step failed".to_string());

        let json = serde_json::to_string(&result).unwrap();
        let decoded: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn content_gap_uses_type_as_wire_name() {
        let gap = ContentGap {
            gap: "Pricing transparency".to_string(),
            kind: ContentGapKind::IndustryStandard,
            priority: Some(Priority::High),
        };
        let json = serde_json::to_value(&gap).unwrap();
        assert_eq!(json["type"], "industry_standard");
        assert_eq!(json["priority"], "high");
    }
}
