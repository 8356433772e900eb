//! Tool adapters
//!
//! A single interface over the external backends the retrieval stage can
//! dispatch to. Every adapter normalizes its results into
//! [`relay_core::Evidence`]; timeout and bounded retry are applied uniformly
//! by the [`ToolRegistry`], so adapters stay plain backend calls.

pub mod calculator;
pub mod crawl;
pub mod registry;
pub mod retriever;
pub mod web_search;

pub use calculator::CalculatorAdapter;
pub use crawl::TargetedCrawlAdapter;
pub use registry::ToolRegistry;
pub use retriever::{InternalRetrievalAdapter, KeywordRetriever, RetrieverBackend};
pub use web_search::{SearchConfig, WebSearchAdapter};

use async_trait::async_trait;
use relay_core::{Evidence, ToolKind};
use std::time::Duration;
use thiserror::Error;

/// Options accepted by a tool call
#[derive(Debug, Clone)]
pub struct ToolOptions {
    /// Maximum evidence items to return
    pub top_k: usize,
    /// Explicit target URL for targeted_crawl
    pub target: Option<String>,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            target: None,
        }
    }
}

impl ToolOptions {
    /// Set the crawl target
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Errors raised by tool adapters
#[derive(Debug, Error)]
pub enum ToolError {
    /// The backend for this tool is not configured
    #[error("tool {0} needs configuration")]
    NeedsConfiguration(ToolKind),

    /// The call exceeded the adapter timeout
    #[error("tool call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend failed
    #[error("backend error: {message}")]
    Backend {
        /// Human-readable description
        message: String,
        /// Whether another attempt might succeed
        retryable: bool,
    },

    /// The query was not usable by this tool
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ToolError {
    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ToolError::Timeout(_)
                | ToolError::Backend {
                    retryable: true,
                    ..
                }
        )
    }

    /// Convenience constructor for a retryable backend failure
    pub fn transient(message: impl Into<String>) -> Self {
        ToolError::Backend {
            message: message.into(),
            retryable: true,
        }
    }

    /// Convenience constructor for a permanent backend failure
    pub fn permanent(message: impl Into<String>) -> Self {
        ToolError::Backend {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Per-call execution policy applied by the registry
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// Timeout per attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Backoff before the first retry; grows to `max_backoff`
    pub initial_backoff: Duration,
    /// Backoff cap
    pub max_backoff: Duration,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_millis(800),
        }
    }
}

/// Uniform interface over an external tool backend
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Which tool this adapter serves
    fn kind(&self) -> ToolKind;

    /// Whether the backend is usable; unconfigured tools must not be routed to
    fn is_configured(&self) -> bool;

    /// Execute one backend call
    async fn execute(&self, query: &str, options: &ToolOptions) -> Result<Vec<Evidence>, ToolError>;
}
