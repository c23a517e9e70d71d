//! Location resolution, nearby-city discovery and targeting clusters.

use std::sync::Arc;

use ranksavvy_core::{
    Bounds, ClusterType, Coordinates, Location, LocationCluster, Lookup, NearbyCity, ServiceArea,
};

use crate::collaborators::{GeoResolver, Place};
use crate::runner::{ParallelTaskRunner, TaskOutcome};

const MILES_PER_DEGREE_LAT: f64 = 69.0;
const EARTH_RADIUS_MILES: f64 = 3958.8;
const MAX_NEARBY_CITIES: usize = 10;
const AREA_CLUSTER_MILES: f64 = 15.0;
const REGION_CLUSTER_MILES: f64 = 30.0;
const AREA_CLUSTER_MAX_EXTRA: usize = 5;
const AREA_RECOMMEND_MIN: usize = 3;
const REGION_MIN_CITIES: usize = 5;
/// Public Nominatim allows one request in flight per client.
const GEOCODER_CONCURRENCY: usize = 1;

/// Degree offsets of the reverse-geocoding probe ring around the centre.
pub const PROBE_OFFSETS: [(f64, f64); 8] = [
    (0.1, 0.1),
    (0.1, -0.1),
    (-0.1, 0.1),
    (-0.1, -0.1),
    (0.15, 0.0),
    (0.0, 0.15),
    (-0.15, 0.0),
    (0.0, -0.15),
];

#[derive(Clone)]
pub struct GeoAgent {
    resolver: Arc<dyn GeoResolver>,
    runner: ParallelTaskRunner,
    region_clusters_validated: bool,
}

impl GeoAgent {
    #[must_use]
    pub fn new(resolver: Arc<dyn GeoResolver>, region_clusters_validated: bool) -> Self {
        Self {
            resolver,
            runner: ParallelTaskRunner::new(GEOCODER_CONCURRENCY),
            region_clusters_validated,
        }
    }

    /// Resolve `location` and, when `radius` is positive, its service area
    /// and nearby cities. Never fails: a geocoding problem is recorded in
    /// [`Location::error`].
    pub async fn analyze_location(&self, location: &str, radius: Option<f64>) -> Location {
        tracing::info!(location, radius, "analyzing location");
        let mut geo = Location::unresolved(location);

        let place = match Lookup::from_result(self.resolver.geocode(location).await) {
            Lookup::Found(place) => place,
            Lookup::Absent => {
                tracing::warn!(location, "geocoder returned no match");
                geo.error = Some(format!("no geocoding match for '{location}'"));
                return geo;
            }
            Lookup::Failed(reason) => {
                tracing::warn!(location, error = %reason, "geocoding failed");
                geo.error = Some(reason);
                return geo;
            }
        };

        let center = place.coordinates;
        geo.coordinates = Some(center);
        geo.city = place.address.locality().map(str::to_owned);
        geo.state.clone_from(&place.address.state);
        geo.county.clone_from(&place.address.county);
        geo.zip_codes = place.address.postcode.iter().cloned().collect();
        geo.population_density = place.address.population_density();

        if let Some(radius) = radius.filter(|r| *r > 0.0) {
            geo.service_area = Some(service_area(center, radius));
            geo.nearby_cities = self.find_nearby_cities(center, radius).await;
        }

        geo
    }

    async fn find_nearby_cities(&self, center: Coordinates, radius: f64) -> Vec<NearbyCity> {
        let probes: Vec<Coordinates> = PROBE_OFFSETS
            .iter()
            .map(|(dlat, dlon)| Coordinates::new(center.lat + dlat, center.lon + dlon))
            .collect();

        let tasks = probes.iter().map(|point| {
            let resolver = Arc::clone(&self.resolver);
            let point = *point;
            async move { resolver.reverse(point).await }
        });
        let outcomes = self.runner.run_all(tasks).await;

        let mut cities: Vec<NearbyCity> = Vec::new();
        for (point, outcome) in probes.into_iter().zip(outcomes) {
            let place: Place = match outcome {
                TaskOutcome::Success(Some(place)) => place,
                TaskOutcome::Success(None) => continue,
                TaskOutcome::Failure(reason) => {
                    tracing::warn!(lat = point.lat, lon = point.lon, error = %reason, "reverse probe failed");
                    continue;
                }
            };
            let Some(name) = place.address.locality() else {
                continue;
            };

            let distance = haversine_miles(center, point);
            if distance <= radius && !cities.iter().any(|c| c.name == name) {
                cities.push(NearbyCity {
                    name: name.to_owned(),
                    distance_miles: round_tenth(distance),
                    state: place.address.state.clone().unwrap_or_default(),
                    coordinates: point,
                });
            }
        }

        cities.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
        cities.truncate(MAX_NEARBY_CITIES);
        cities
    }

    /// Candidate targeting clusters: the primary place, a close "area" and,
    /// when enough cities are in reach, a wider "region".
    #[must_use]
    pub fn suggest_location_clusters(
        &self,
        primary: &str,
        nearby: &[NearbyCity],
    ) -> Vec<LocationCluster> {
        let mut clusters = vec![LocationCluster {
            name: format!("{primary} Metro"),
            locations: vec![primary.to_owned()],
            cluster_type: ClusterType::Primary,
            recommended: true,
        }];

        let within = |miles: f64| -> Vec<String> {
            nearby
                .iter()
                .filter(|c| c.distance_miles <= miles)
                .map(|c| c.name.clone())
                .collect()
        };

        let close = within(AREA_CLUSTER_MILES);
        if !close.is_empty() {
            let mut locations = vec![primary.to_owned()];
            locations.extend(close.iter().take(AREA_CLUSTER_MAX_EXTRA).cloned());
            clusters.push(LocationCluster {
                name: format!("{primary} Area"),
                locations,
                cluster_type: ClusterType::Expanded,
                recommended: close.len() >= AREA_RECOMMEND_MIN,
            });
        }

        let regional = within(REGION_CLUSTER_MILES);
        if regional.len() >= REGION_MIN_CITIES {
            let mut locations = vec![primary.to_owned()];
            locations.extend(regional);
            clusters.push(LocationCluster {
                name: format!("{primary} Region"),
                locations,
                cluster_type: ClusterType::Regional,
                recommended: self.region_clusters_validated,
            });
        }

        clusters
    }

    /// Normalise a place name for use in search queries.
    #[must_use]
    pub fn format_location_for_search(location: &str, state: Option<&str>) -> String {
        let mut formatted = location.trim().to_owned();
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            if !formatted.to_lowercase().contains(&state.to_lowercase()) {
                formatted = format!("{formatted} {state}");
            }
        }
        formatted.replace("St.", "Saint").replace("Mt.", "Mount")
    }
}

/// Bounding box of `radius` miles around `center`. Longitude spread is
/// scaled by latitude, clamped so it stays finite near the equator.
#[must_use]
pub fn service_area(center: Coordinates, radius: f64) -> ServiceArea {
    let lat_delta = radius / MILES_PER_DEGREE_LAT;
    let lon_delta = radius / (MILES_PER_DEGREE_LAT * (center.lat.abs() / 90.0).max(0.1));
    ServiceArea {
        center,
        radius_miles: radius,
        bounds: Bounds {
            north: center.lat + lat_delta,
            south: center.lat - lat_delta,
            east: center.lon + lon_delta,
            west: center.lon - lon_delta,
        },
    }
}

/// Great-circle distance in miles.
#[must_use]
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
#[path = "geo_test.rs"]
mod tests;
