//! Tool registry and uniform execution policy

use super::{AdapterSettings, ToolAdapter, ToolError, ToolOptions};
use relay_core::{Evidence, ToolKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tooling::async_utils::timeout::{with_timeout, TimeoutError};

/// Lookup table of tool adapters with a shared execution policy
///
/// Timeout and bounded retry are applied here, uniformly, so individual
/// adapters remain plain backend calls.
pub struct ToolRegistry {
    adapters: HashMap<ToolKind, Arc<dyn ToolAdapter>>,
    settings: AdapterSettings,
}

impl ToolRegistry {
    /// Create an empty registry with the given policy
    pub fn new(settings: AdapterSettings) -> Self {
        Self {
            adapters: HashMap::new(),
            settings,
        }
    }

    /// Register an adapter under its own kind
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) -> &mut Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// Whether a tool has a configured backend
    pub fn is_configured(&self, kind: ToolKind) -> bool {
        self.adapters
            .get(&kind)
            .map(|adapter| adapter.is_configured())
            .unwrap_or(false)
    }

    /// Backend status per registered tool, for health reporting
    pub fn health(&self) -> BTreeMap<&'static str, &'static str> {
        self.adapters
            .values()
            .map(|adapter| {
                let status = if adapter.is_configured() {
                    "configured"
                } else {
                    "needs_configuration"
                };
                (adapter.kind().as_str(), status)
            })
            .collect()
    }

    /// Execute a tool call with timeout and bounded retry
    ///
    /// Retries only retryable failures, up to `max_retries` extra attempts
    /// with exponential backoff between `initial_backoff` and `max_backoff`.
    pub async fn run_tool(
        &self,
        kind: ToolKind,
        query: &str,
        options: &ToolOptions,
    ) -> Result<Vec<Evidence>, ToolError> {
        let adapter = self
            .adapters
            .get(&kind)
            .ok_or(ToolError::NeedsConfiguration(kind))?;
        if !adapter.is_configured() {
            return Err(ToolError::NeedsConfiguration(kind));
        }

        let mut attempt = 0;
        loop {
            let result = with_timeout(self.settings.timeout, adapter.execute(query, options)).await;
            let error = match result {
                Ok(evidence) => return Ok(evidence),
                Err(TimeoutError::Timeout(duration)) => ToolError::Timeout(duration),
                Err(TimeoutError::OperationFailed(e)) => e,
            };

            if error.is_retryable() && attempt < self.settings.max_retries {
                let backoff = self
                    .settings
                    .initial_backoff
                    .saturating_mul(1 << (attempt.min(4) as u32 * 2))
                    .min(self.settings.max_backoff);
                tracing::warn!(
                    tool = kind.as_str(),
                    attempt = attempt + 1,
                    error = %error,
                    "Tool call failed, retrying after {:?}",
                    backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            return Err(error);
        }
    }
}
