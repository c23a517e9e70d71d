//! Messages API client used as the [`TextAnalyzer`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::collaborators::TextAnalyzer;
use crate::error::AgentError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`AgentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
        })
    }
}

#[async_trait]
impl TextAnalyzer for AnthropicClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, AgentError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|source| AgentError::Deserialize {
                context: url,
                source,
            })?;

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| AgentError::TextAnalyzer("response contained no text block".to_string()))
    }
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredAnalyzer;

#[async_trait]
impl TextAnalyzer for UnconfiguredAnalyzer {
    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, AgentError> {
        Err(AgentError::NotConfigured("ANTHROPIC_API_KEY"))
    }
}
