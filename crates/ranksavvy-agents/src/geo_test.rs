use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::*;
use crate::collaborators::Address;
use crate::error::AgentError;

/// Resolves one fixed place and answers reverse probes by offset index.
struct StubResolver {
    center: Option<Place>,
    fail_geocode: bool,
    reverse: HashMap<usize, &'static str>,
    origin: Coordinates,
}

impl StubResolver {
    fn pelham() -> Self {
        let origin = Coordinates::new(33.3, -86.8);
        Self {
            center: Some(Place {
                coordinates: origin,
                address: Address {
                    city: Some("Pelham".to_string()),
                    state: Some("Alabama".to_string()),
                    county: Some("Shelby County".to_string()),
                    postcode: Some("35124".to_string()),
                    ..Address::default()
                },
            }),
            fail_geocode: false,
            reverse: HashMap::new(),
            origin,
        }
    }

    fn offset_index(&self, point: Coordinates) -> Option<usize> {
        PROBE_OFFSETS.iter().position(|(dlat, dlon)| {
            (self.origin.lat + dlat - point.lat).abs() < 1e-9
                && (self.origin.lon + dlon - point.lon).abs() < 1e-9
        })
    }
}

#[async_trait]
impl GeoResolver for StubResolver {
    async fn geocode(&self, _query: &str) -> Result<Option<Place>, AgentError> {
        if self.fail_geocode {
            return Err(AgentError::Geocoder("service unavailable".to_string()));
        }
        Ok(self.center.clone())
    }

    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, AgentError> {
        let Some(index) = self.offset_index(point) else {
            return Ok(None);
        };
        match self.reverse.get(&index) {
            Some(&"ERR") => Err(AgentError::Geocoder("rate limited".to_string())),
            Some(name) => Ok(Some(Place {
                coordinates: point,
                address: Address {
                    town: Some((*name).to_string()),
                    state: Some("Alabama".to_string()),
                    ..Address::default()
                },
            })),
            None => Ok(None),
        }
    }
}

fn agent(resolver: StubResolver, validated: bool) -> GeoAgent {
    GeoAgent::new(Arc::new(resolver), validated)
}

fn city(name: &str, distance_miles: f64) -> NearbyCity {
    NearbyCity {
        name: name.to_string(),
        distance_miles,
        state: "Alabama".to_string(),
        coordinates: Coordinates::default(),
    }
}

#[tokio::test]
async fn analyze_location_fills_admin_fields() {
    let geo = agent(StubResolver::pelham(), false)
        .analyze_location("Pelham Alabama", None)
        .await;

    assert_eq!(geo.primary_location, "Pelham Alabama");
    assert_eq!(geo.city.as_deref(), Some("Pelham"));
    assert_eq!(geo.state.as_deref(), Some("Alabama"));
    assert_eq!(geo.zip_codes, vec!["35124".to_string()]);
    assert!(geo.service_area.is_none());
    assert!(geo.nearby_cities.is_empty());
    assert!(geo.error.is_none());
}

#[tokio::test]
async fn geocode_failure_is_recorded_not_raised() {
    let mut resolver = StubResolver::pelham();
    resolver.fail_geocode = true;
    let geo = agent(resolver, false)
        .analyze_location("Nowhere", Some(10.0))
        .await;

    assert!(geo.coordinates.is_none());
    assert!(geo
        .error
        .as_deref()
        .is_some_and(|e| e.contains("service unavailable")));
}

#[tokio::test]
async fn geocode_miss_is_recorded() {
    let mut resolver = StubResolver::pelham();
    resolver.center = None;
    let geo = agent(resolver, false).analyze_location("Atlantis", None).await;
    assert!(geo.error.is_some());
}

#[tokio::test]
async fn nearby_cities_are_deduplicated_sorted_and_filtered() {
    let mut resolver = StubResolver::pelham();
    resolver.reverse.insert(0, "Helena"); // (0.1, 0.1): ~9.0 mi
    resolver.reverse.insert(1, "Helena"); // duplicate name
    resolver.reverse.insert(4, "Alabaster"); // (0.15, 0): ~10.4 mi
    resolver.reverse.insert(5, "Hoover"); // (0, 0.15): ~8.7 mi
    resolver.reverse.insert(6, "ERR");

    let geo = agent(resolver, false)
        .analyze_location("Pelham Alabama", Some(40.0))
        .await;

    let names: Vec<&str> = geo.nearby_cities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Hoover", "Helena", "Alabaster"]);
    for pair in geo.nearby_cities.windows(2) {
        assert!(pair[0].distance_miles <= pair[1].distance_miles);
    }
    let service_area = geo.service_area.expect("radius should produce a service area");
    assert!((service_area.bounds.north - (33.3 + 40.0 / 69.0)).abs() < 1e-9);
}

#[tokio::test]
async fn small_radius_excludes_far_probes() {
    let mut resolver = StubResolver::pelham();
    resolver.reverse.insert(4, "Alabaster");
    let geo = agent(resolver, false)
        .analyze_location("Pelham Alabama", Some(5.0))
        .await;
    assert!(geo.nearby_cities.is_empty());
}

/// Records how many reverse lookups overlap.
#[derive(Default)]
struct CountingResolver {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl GeoResolver for CountingResolver {
    async fn geocode(&self, _query: &str) -> Result<Option<Place>, AgentError> {
        Ok(StubResolver::pelham().center)
    }

    async fn reverse(&self, _point: Coordinates) -> Result<Option<Place>, AgentError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[tokio::test]
async fn reverse_probes_run_one_at_a_time() {
    let resolver = Arc::new(CountingResolver::default());
    let agent = GeoAgent::new(Arc::clone(&resolver) as Arc<dyn GeoResolver>, false);

    agent.analyze_location("Pelham Alabama", Some(40.0)).await;

    assert_eq!(resolver.calls.load(Ordering::SeqCst), PROBE_OFFSETS.len());
    assert_eq!(resolver.peak.load(Ordering::SeqCst), 1);
}

#[test]
fn distances_are_rounded_to_one_decimal() {
    assert!((round_tenth(8.649) - 8.6).abs() < f64::EPSILON);
    assert!((round_tenth(8.65001) - 8.7).abs() < f64::EPSILON);
}

#[test]
fn service_area_longitude_delta_is_clamped_near_equator() {
    let area = service_area(Coordinates::new(0.0, 10.0), 69.0);
    // factor clamps to 0.1 -> lon delta = 69 / (69 * 0.1) = 10
    assert!((area.bounds.east - 20.0).abs() < 1e-9);
    assert!((area.bounds.north - 1.0).abs() < 1e-9);
}

#[test]
fn haversine_of_tenth_degree_latitude() {
    let d = haversine_miles(Coordinates::new(33.0, -86.0), Coordinates::new(33.1, -86.0));
    assert!((d - 6.9).abs() < 0.1, "got {d}");
}

#[test]
fn clusters_for_sparse_area() {
    let agent = agent(StubResolver::pelham(), false);
    let clusters = agent.suggest_location_clusters("Pelham", &[city("Helena", 8.0)]);

    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[0].name, "Pelham Metro");
    assert!(clusters[0].recommended);
    assert_eq!(clusters[1].cluster_type, ClusterType::Expanded);
    assert_eq!(clusters[1].locations, vec!["Pelham", "Helena"]);
    assert!(!clusters[1].recommended);
}

#[test]
fn clusters_for_dense_area_follow_region_policy() {
    let nearby = vec![
        city("Helena", 5.0),
        city("Alabaster", 7.0),
        city("Hoover", 9.0),
        city("Chelsea", 12.0),
        city("Calera", 14.0),
        city("Vestavia Hills", 16.0),
        city("Birmingham", 25.0),
    ];

    let unvalidated = agent(StubResolver::pelham(), false).suggest_location_clusters("Pelham", &nearby);
    assert_eq!(unvalidated.len(), 3);
    let area = &unvalidated[1];
    assert!(area.recommended);
    assert_eq!(area.locations.len(), 6, "primary plus at most five cities");
    let region = &unvalidated[2];
    assert_eq!(region.cluster_type, ClusterType::Regional);
    assert_eq!(region.locations.len(), 8);
    assert!(!region.recommended);

    let validated = agent(StubResolver::pelham(), true).suggest_location_clusters("Pelham", &nearby);
    assert!(validated[2].recommended);
}

#[test]
fn no_nearby_cities_yields_primary_only() {
    let clusters = agent(StubResolver::pelham(), false).suggest_location_clusters("Pelham", &[]);
    assert_eq!(clusters.len(), 1);
}

#[test]
fn format_location_appends_state_and_expands_abbreviations() {
    assert_eq!(
        GeoAgent::format_location_for_search("  St. Louis ", Some("Missouri")),
        "Saint Louis Missouri"
    );
    assert_eq!(
        GeoAgent::format_location_for_search("Pelham Alabama", Some("alabama")),
        "Pelham Alabama"
    );
    assert_eq!(
        GeoAgent::format_location_for_search("Mt. Olive", None),
        "Mount Olive"
    );
}
