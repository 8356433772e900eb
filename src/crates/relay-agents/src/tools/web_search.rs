//! Web search adapter
//!
//! Talks to a JSON search API (any endpoint returning a `results` array of
//! title/url/snippet objects). The provider itself is an external
//! collaborator; only the normalized shape matters here.

use super::{ToolAdapter, ToolError, ToolOptions};
use async_trait::async_trait;
use relay_core::{Evidence, ToolKind};
use serde::Deserialize;

/// Connection settings for the search provider
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// API key sent as a bearer token
    pub api_key: String,
}

/// Adapter over a JSON web search API
pub struct WebSearchAdapter {
    config: Option<SearchConfig>,
    client: reqwest::Client,
}

impl WebSearchAdapter {
    /// Create an adapter; pass `None` when no provider is configured
    pub fn new(config: Option<SearchConfig>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    score: Option<f64>,
}

#[async_trait]
impl ToolAdapter for WebSearchAdapter {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn execute(&self, query: &str, options: &ToolOptions) -> Result<Vec<Evidence>, ToolError> {
        let config = self
            .config
            .as_ref()
            .ok_or(ToolError::NeedsConfiguration(ToolKind::WebSearch))?;

        let response = self
            .client
            .get(&config.endpoint)
            .query(&[("q", query), ("count", &options.top_k.to_string())])
            .bearer_auth(&config.api_key)
            .send()
            .await
            .map_err(|e| ToolError::transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = format!("search API returned {}", status);
            return Err(if status.is_server_error() {
                ToolError::transient(message)
            } else {
                ToolError::permanent(message)
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::permanent(format!("unparseable search response: {e}")))?;

        Ok(body
            .results
            .into_iter()
            .take(options.top_k)
            .map(|result| {
                let text = if result.title.is_empty() {
                    result.snippet
                } else if result.snippet.is_empty() {
                    result.title
                } else {
                    format!("{}: {}", result.title, result.snippet)
                };
                let mut evidence = Evidence::new(text, result.url);
                evidence.score = result.score;
                evidence
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_adapter() {
        let adapter = WebSearchAdapter::new(None);
        assert!(!adapter.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_execute_fails() {
        let adapter = WebSearchAdapter::new(None);
        let err = adapter
            .execute("rust", &ToolOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ToolError::NeedsConfiguration(ToolKind::WebSearch)
        ));
    }

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let raw = r#"{"results": [{"url": "https://example.com", "snippet": "an example"}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert!(parsed.results[0].title.is_empty());
    }
}
