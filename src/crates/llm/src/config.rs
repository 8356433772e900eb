//! Configuration for remote language model providers

use crate::error::{LlmError, Result};
use std::time::Duration;

/// Default chat completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for a remote provider
#[derive(Debug, Clone)]
pub struct RemoteLlmConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL of the chat completions API
    pub base_url: String,
    /// Default model name
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Default sampling temperature
    pub temperature: Option<f32>,
}

impl RemoteLlmConfig {
    /// Create a configuration with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            temperature: None,
        }
    }

    /// Load the API key from an environment variable
    pub fn from_env(key_var: &str) -> Result<Self> {
        let api_key = std::env::var(key_var)
            .map_err(|_| LlmError::ApiKeyNotFound(key_var.to_string()))?;
        Ok(Self::new(api_key))
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RemoteLlmConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_from_env_missing_key() {
        let result = RemoteLlmConfig::from_env("RELAY_TEST_MISSING_LLM_KEY");
        assert!(matches!(result, Err(LlmError::ApiKeyNotFound(_))));
    }

    #[test]
    fn test_builder_overrides() {
        let config = RemoteLlmConfig::new("sk-test")
            .with_model("gpt-4o")
            .with_base_url("http://localhost:8000/v1")
            .with_temperature(0.2);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "http://localhost:8000/v1");
        assert_eq!(config.temperature, Some(0.2));
    }
}
