use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Coarse density class derived from the geocoder's place type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationDensity {
    Urban,
    Suburban,
    Rural,
    #[default]
    Unknown,
}

/// A place discovered near the analysed location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyCity {
    pub name: String,
    /// Distance from the centre, rounded to one decimal place.
    pub distance_miles: f64,
    #[serde(default)]
    pub state: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Approximate bounding box around the analysed location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceArea {
    pub center: Coordinates,
    pub radius_miles: f64,
    pub bounds: Bounds,
}

/// Geographic context for one analysis run.
///
/// Produced once by the geo agent and read-only afterwards. When geocoding
/// fails, everything but `primary_location` stays empty and `error` says why.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub primary_location: String,
    pub coordinates: Option<Coordinates>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub zip_codes: Vec<String>,
    pub nearby_cities: Vec<NearbyCity>,
    pub service_area: Option<ServiceArea>,
    pub population_density: PopulationDensity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Location {
    /// An unresolved location carrying only the caller's place name.
    #[must_use]
    pub fn unresolved(primary_location: &str) -> Self {
        Self {
            primary_location: primary_location.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterType {
    Primary,
    Expanded,
    Regional,
}

/// A candidate set of place names to target together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCluster {
    pub name: String,
    pub locations: Vec<String>,
    #[serde(rename = "type")]
    pub cluster_type: ClusterType,
    pub recommended: bool,
}
