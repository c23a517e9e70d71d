//! Volume/competition estimation and keyword valuation.
//!
//! Both functions are pure. Categorical fields are only ever raised from
//! `Unknown`, so an earlier, stronger signal is never overwritten.

use ranksavvy_core::{
    CompetitionLevel, Intent, KeywordCategory, KeywordRecord, SerpFeatureSet, VolumeEstimate,
    VolumeIndicators,
};

/// Estimate search volume and competition from a result page's features.
#[must_use]
pub fn serp_feature_score(features: &SerpFeatureSet) -> VolumeIndicators {
    let mut indicators = VolumeIndicators::default();

    match features.ad_count {
        n if n >= 4 => {
            indicators.estimated_volume = VolumeEstimate::High;
            indicators.competition_level = CompetitionLevel::High;
            indicators.commercial_intent = true;
            indicators.score += 3;
        }
        n if n >= 2 => {
            indicators.estimated_volume = VolumeEstimate::Medium;
            indicators.competition_level = CompetitionLevel::Medium;
            indicators.commercial_intent = true;
            indicators.score += 2;
        }
        1 => {
            indicators.estimated_volume = VolumeEstimate::LowMedium;
            indicators.competition_level = CompetitionLevel::Low;
            indicators.score += 1;
        }
        _ => {}
    }

    if features.local_pack_size > 0 {
        indicators.local_intent = true;
        indicators.score += 2;
        // A full three-pack means local competition is saturated.
        if features.local_pack_size == 3
            && indicators.competition_level == CompetitionLevel::Unknown
        {
            indicators.competition_level = CompetitionLevel::High;
        }
    }

    if features.people_also_ask > 0 {
        indicators.informational_intent = true;
        indicators.score += 1;
    }

    if features.featured_snippet {
        if indicators.estimated_volume == VolumeEstimate::Unknown {
            indicators.estimated_volume = VolumeEstimate::High;
        }
        indicators.score += 2;
    }

    if features.knowledge_panel {
        indicators.score += 1;
    }

    if features.related_searches >= 6 {
        indicators.score += 1;
    }

    indicators
}

/// Single comparable value for ranking keywords.
///
/// Multipliers are integer percentages applied to the same base, so the
/// result is independent of rule order and never negative.
#[must_use]
pub fn keyword_value(record: &KeywordRecord) -> u32 {
    let base = u64::from(record.search_volume_score) * 10;

    let intent_pct: u64 = match record.intent {
        Intent::Urgent => 150,
        Intent::Commercial => 130,
        Intent::Informational | Intent::None => 100,
    };

    let competition_pct: u64 = match record.competition {
        CompetitionLevel::Low => 150,
        CompetitionLevel::Medium => 120,
        CompetitionLevel::High => 80,
        CompetitionLevel::Unknown => 100,
    };

    let bonus: u64 = match record.category {
        KeywordCategory::Emergency => 20,
        KeywordCategory::Autocomplete => 15,
        KeywordCategory::Primary | KeywordCategory::Commercial | KeywordCategory::AiSuggested => 0,
    };

    let value = base * intent_pct * competition_pct / 10_000 + bonus;
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "scoring_test.rs"]
mod tests;
