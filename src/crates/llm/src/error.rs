//! Error types for language model providers

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when calling a language model provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API authentication failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// API key not found in the environment
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Provider returned an unusable response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Any other provider failure
    #[error("Provider error: {0}")]
    Provider(String),
}

impl LlmError {
    /// Whether the call is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Http(_) | LlmError::RateLimited(_) | LlmError::Timeout(_)
        )
    }
}

/// Surface provider failures to the graph runtime with their retryability
impl From<LlmError> for relay_core::GraphError {
    fn from(err: LlmError) -> Self {
        relay_core::GraphError::Llm {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::RateLimited("slow down".to_string()).is_retryable());
        assert!(LlmError::Timeout("60s".to_string()).is_retryable());
        assert!(!LlmError::Authentication("bad key".to_string()).is_retryable());
        assert!(!LlmError::InvalidResponse("no choices".to_string()).is_retryable());
    }

    #[test]
    fn test_converts_to_graph_error() {
        let err: relay_core::GraphError = LlmError::Timeout("60s".to_string()).into();
        assert!(err.is_retryable());

        let err: relay_core::GraphError = LlmError::Authentication("nope".to_string()).into();
        assert!(!err.is_retryable());
    }
}
