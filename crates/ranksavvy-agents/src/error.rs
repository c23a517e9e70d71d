use thiserror::Error;

/// Errors raised at a collaborator boundary.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("scraper error: {0}")]
    Scraper(String),

    #[error("text analyzer error: {0}")]
    TextAnalyzer(String),

    #[error("geocoder error: {0}")]
    Geocoder(String),

    /// The collaborator has no credentials configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
