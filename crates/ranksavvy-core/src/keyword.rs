use serde::{Deserialize, Serialize};

use crate::serp::CompetitionLevel;

/// Where a keyword came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCategory {
    #[default]
    Primary,
    Autocomplete,
    Emergency,
    Commercial,
    AiSuggested,
}

impl KeywordCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeywordCategory::Primary => "primary",
            KeywordCategory::Autocomplete => "autocomplete",
            KeywordCategory::Emergency => "emergency",
            KeywordCategory::Commercial => "commercial",
            KeywordCategory::AiSuggested => "ai_suggested",
        }
    }
}

/// Searcher intent attributed to a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Urgent,
    Commercial,
    Informational,
    #[default]
    None,
}

impl Intent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Urgent => "urgent",
            Intent::Commercial => "commercial",
            Intent::Informational => "informational",
            Intent::None => "none",
        }
    }
}

/// One scored keyword. The keyword text identifies it within a run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordRecord {
    pub keyword: String,
    #[serde(rename = "type")]
    pub category: KeywordCategory,
    pub intent: Intent,
    pub search_volume_score: u32,
    pub competition: CompetitionLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity_rank: Option<u32>,
}

impl KeywordRecord {
    #[must_use]
    pub fn new(keyword: impl Into<String>, category: KeywordCategory, intent: Intent) -> Self {
        Self {
            keyword: keyword.into(),
            category,
            intent,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_volume(mut self, search_volume_score: u32, competition: CompetitionLevel) -> Self {
        self.search_volume_score = search_volume_score;
        self.competition = competition;
        self
    }
}

/// Everything the keyword agent learned about one service/location pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordDiscoveryResult {
    pub primary_keyword: String,
    pub emergency_keywords: Vec<KeywordRecord>,
    pub intent_keywords: Vec<KeywordRecord>,
    /// "People also ask" questions from the primary result page.
    pub questions: Vec<String>,
    /// AI-suggested long-tail keywords.
    pub long_tail: Vec<KeywordRecord>,
    pub related_searches: Vec<String>,
    pub autocomplete: Vec<String>,
    /// Every source merged, deduplicated by text and ranked by keyword value.
    pub all_keywords: Vec<KeywordRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_record_uses_type_as_wire_name() {
        let record = KeywordRecord::new("hvac repair", KeywordCategory::AiSuggested, Intent::Commercial)
            .with_volume(3, CompetitionLevel::Low);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "ai_suggested");
        assert_eq!(json["intent"], "commercial");
        assert_eq!(json["competition"], "low");
        assert!(json.get("popularity_rank").is_none());
    }

    #[test]
    fn keyword_record_defaults_missing_fields() {
        let record: KeywordRecord = serde_json::from_str(r#"{"keyword": "ac fix"}"#).unwrap();
        assert_eq!(record.category, KeywordCategory::Primary);
        assert_eq!(record.intent, Intent::None);
        assert_eq!(record.competition, CompetitionLevel::Unknown);
        assert_eq!(record.search_volume_score, 0);
    }
}
