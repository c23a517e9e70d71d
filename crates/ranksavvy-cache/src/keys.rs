//! Deterministic cache keys.
//!
//! Keys are colon-joined tokens. A missing optional argument renders as
//! `None` so the same argument tuple always yields the same key, and keys
//! stay compatible with entries written by earlier deployments.

const NONE_TOKEN: &str = "None";

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or(NONE_TOKEN)
}

/// Whole-number radii render without a fractional part (`40`, not `40.0`).
fn radius_token(radius: Option<f64>) -> String {
    radius.map_or_else(|| NONE_TOKEN.to_string(), |r| r.to_string())
}

#[must_use]
pub fn niche_analysis_key(query: &str, location: &str, radius: Option<f64>) -> String {
    format!("niche_analysis:{query}:{location}:{}", radius_token(radius))
}

#[must_use]
pub fn serp_key(query: &str, location: Option<&str>) -> String {
    format!("serp:{query}:{}", opt(location))
}

#[must_use]
pub fn autocomplete_key(query: &str, location: Option<&str>) -> String {
    format!("autocomplete:{query}:{}", opt(location))
}

#[must_use]
pub fn local_competitors_key(query: &str, location: &str) -> String {
    format!("local_competitors:{query}:{location}")
}

#[must_use]
pub fn competitor_site_key(url: &str) -> String {
    format!("competitor_site:{url}")
}
