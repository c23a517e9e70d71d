//! In-process collaborators with call counters for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ranksavvy_agents::{
    AgentError, AgentSettings, Collaborators, GeoResolver, LeadAgent, Place, Scraper, TextAnalyzer,
};
use ranksavvy_agents::Address;
use ranksavvy_cache::{CacheStore, MemoryCache};
use ranksavvy_core::{AdResult, Coordinates, LocalListing, OrganicResult, SerpPage, SiteData};

pub const PELHAM: Coordinates = Coordinates {
    lat: 33.2856,
    lon: -86.8099,
};

#[derive(Default)]
pub struct FakeScraper {
    pub pages: HashMap<String, SerpPage>,
    pub listings: Vec<LocalListing>,
    pub suggestions: Vec<String>,
    pub sites: HashMap<String, SiteData>,
    pub fail_queries: HashSet<String>,
    pub serp_queries: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl FakeScraper {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saw_query(&self, query: &str) -> bool {
        self.serp_queries
            .lock()
            .expect("query log poisoned")
            .iter()
            .any(|q| q == query)
    }
}

#[async_trait]
impl Scraper for FakeScraper {
    async fn scrape_serp(
        &self,
        query: &str,
        _location: Option<&str>,
    ) -> Result<SerpPage, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.serp_queries
            .lock()
            .expect("query log poisoned")
            .push(query.to_string());
        if self.fail_queries.contains(query) {
            return Err(AgentError::Scraper(format!("blocked while scraping '{query}'")));
        }
        Ok(self.pages.get(query).cloned().unwrap_or_default())
    }

    async fn autocomplete(
        &self,
        _query: &str,
        _location: Option<&str>,
    ) -> Result<Vec<String>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.suggestions.clone())
    }

    async fn local_listings(
        &self,
        _query: &str,
        _location: &str,
    ) -> Result<Vec<LocalListing>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.listings.clone())
    }

    async fn scrape_site(&self, url: &str) -> Result<SiteData, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sites
            .get(url)
            .cloned()
            .ok_or_else(|| AgentError::Scraper(format!("timeout loading {url}")))
    }
}

/// Routes prompts by their wording so concurrent calls stay deterministic.
#[derive(Default)]
pub struct FakeAnalyzer {
    pub calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextAnalyzer for FakeAnalyzer {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if prompt.contains("closely related services") {
            "furnace maintenance\nduct cleaning\nAC"
        } else if prompt.contains("competitor's website") {
            "```json\n{\"keywords\": [\"ac repair pelham\", \"hvac service\"], \
             \"service_focus\": [\"repair\"], \"value_propositions\": [\"fast\"], \
             \"content_gaps\": [\"no pricing page\"]}\n```"
        } else {
            "worried about furnace noise pelham\nshort\nhvac repair financing pelham"
        };
        Ok(reply.to_string())
    }
}

#[derive(Default)]
pub struct FakeGeo {
    pub calls: AtomicUsize,
}

impl FakeGeo {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoResolver for FakeGeo {
    async fn geocode(&self, _query: &str) -> Result<Option<Place>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Place {
            coordinates: PELHAM,
            address: Address {
                city: Some("Pelham".to_string()),
                state: Some("Alabama".to_string()),
                county: Some("Shelby County".to_string()),
                postcode: Some("35124".to_string()),
                ..Address::default()
            },
        }))
    }

    async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let town = if point.lat > PELHAM.lat {
            "Helena"
        } else if point.lat < PELHAM.lat {
            "Alabaster"
        } else {
            return Ok(None);
        };
        Ok(Some(Place {
            coordinates: point,
            address: Address {
                town: Some(town.to_string()),
                state: Some("Alabama".to_string()),
                ..Address::default()
            },
        }))
    }
}

fn ads(n: usize) -> Vec<AdResult> {
    (0..n)
        .map(|i| AdResult {
            title: format!("Ad {i}"),
            ..AdResult::default()
        })
        .collect()
}

fn organic(title: &str, url: Option<&str>, position: u32) -> OrganicResult {
    OrganicResult {
        title: title.to_string(),
        url: url.map(str::to_owned),
        snippet: None,
        position,
    }
}

fn site(url: &str) -> SiteData {
    SiteData {
        url: url.to_string(),
        h1_tags: vec!["HVAC Repair in Pelham".to_string()],
        h2_tags: vec![
            "Customer Testimonials".to_string(),
            "Service Area Maps".to_string(),
        ],
        meta_description: Some("Trusted HVAC repair.".to_string()),
        ..SiteData::default()
    }
}

/// The Pelham HVAC market: two local listings, three organic results (one
/// without a URL, one whose site cannot be scraped), emergency variants
/// that show ads and a thin market for "furnace maintenance".
pub fn pelham_scraper() -> FakeScraper {
    let mut pages = HashMap::new();
    pages.insert(
        "HVAC repair".to_string(),
        SerpPage {
            organic_results: vec![
                organic("Acme HVAC", Some("https://acme.example"), 1),
                organic("Directory listing", None, 2),
                organic("Broken HVAC", Some("https://broken.example"), 3),
            ],
            ads: ads(2),
            people_also_ask: vec![
                "How much does HVAC repair cost?".to_string(),
                "Why is my AC blowing warm air?".to_string(),
            ],
            related_searches: vec!["ac repair pelham".to_string()],
            ..SerpPage::default()
        },
    );
    for term in ["emergency", "24/7", "urgent"] {
        for keyword in [
            format!("{term} HVAC repair Pelham Alabama"),
            format!("HVAC repair {term} Pelham Alabama"),
        ] {
            pages.insert(
                keyword,
                SerpPage {
                    ads: ads(1),
                    ..SerpPage::default()
                },
            );
        }
    }
    pages.insert(
        "HVAC repair service Pelham Alabama".to_string(),
        SerpPage {
            ads: ads(4),
            ..SerpPage::default()
        },
    );
    pages.insert(
        "duct cleaning".to_string(),
        SerpPage {
            ads: ads(3),
            ..SerpPage::default()
        },
    );

    let mut sites = HashMap::new();
    sites.insert("https://acme.example".to_string(), site("https://acme.example"));
    sites.insert(
        "https://pelham-air.example".to_string(),
        site("https://pelham-air.example"),
    );

    FakeScraper {
        pages,
        listings: vec![
            LocalListing {
                name: "Pelham Air".to_string(),
                rating: Some(4.7),
                reviews_count: Some(88),
                website: Some("https://pelham-air.example".to_string()),
                ..LocalListing::default()
            },
            LocalListing {
                name: "Shelby Heating".to_string(),
                rating: Some(4.1),
                ..LocalListing::default()
            },
        ],
        suggestions: vec![
            "hvac repair pelham al".to_string(),
            "hvac repair cost".to_string(),
        ],
        sites,
        ..FakeScraper::default()
    }
}

pub struct Harness {
    pub scraper: Arc<FakeScraper>,
    pub analyzer: Arc<FakeAnalyzer>,
    pub geo: Arc<FakeGeo>,
    pub cache: Arc<dyn CacheStore>,
    pub lead: LeadAgent,
}

impl Harness {
    pub fn new(scraper: FakeScraper) -> Self {
        let scraper = Arc::new(scraper);
        let analyzer = Arc::new(FakeAnalyzer::default());
        let geo = Arc::new(FakeGeo::default());
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::default());

        let collaborators = Collaborators {
            scraper: Arc::clone(&scraper) as Arc<dyn Scraper>,
            analyzer: Arc::clone(&analyzer) as Arc<dyn TextAnalyzer>,
            geo: Arc::clone(&geo) as Arc<dyn GeoResolver>,
        };
        let lead = LeadAgent::new(collaborators, Arc::clone(&cache), AgentSettings::default());

        Self {
            scraper,
            analyzer,
            geo,
            cache,
            lead,
        }
    }

    pub fn total_calls(&self) -> usize {
        self.scraper.calls() + self.analyzer.calls() + self.geo.calls()
    }
}
