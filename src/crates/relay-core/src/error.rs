//! Error types for graph execution

use crate::graph::NodeKind;
use std::time::Duration;
use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while executing the pipeline graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node failed
    #[error("Node {node} failed: {message}")]
    Node {
        /// Node that failed
        node: NodeKind,
        /// Human-readable description
        message: String,
        /// Whether re-executing the node might succeed
        retryable: bool,
    },

    /// A node exceeded its per-node timeout
    #[error("Node {node} timed out after {timeout:?}")]
    NodeTimeout {
        /// Node that timed out
        node: NodeKind,
        /// Configured per-node timeout
        timeout: Duration,
    },

    /// The whole-job deadline was exceeded
    ///
    /// The runtime catches this signal itself and closes the run out with
    /// the last draft answer; it does not reach the error terminal.
    #[error("Job deadline of {deadline:?} exceeded")]
    DeadlineExceeded {
        /// Configured job deadline
        deadline: Duration,
    },

    /// Language model call failed
    #[error("Language model error: {message}")]
    Llm {
        /// Human-readable description
        message: String,
        /// Whether the call is worth retrying
        retryable: bool,
    },

    /// Event emission failed repeatedly
    #[error("Event channel failed: {0}")]
    Channel(String),

    /// A node kind has no registered implementation
    #[error("No node registered for {0}")]
    MissingNode(NodeKind),

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid graph or state configuration
    #[error("Validation error: {0}")]
    Validation(String),
}

impl GraphError {
    /// Whether re-executing the failing step might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GraphError::Node { retryable, .. } => *retryable,
            GraphError::NodeTimeout { .. } => true,
            GraphError::Llm { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Stage name reported on the terminal error event
    pub fn stage(&self) -> &'static str {
        match self {
            GraphError::Node { node, .. }
            | GraphError::NodeTimeout { node, .. }
            | GraphError::MissingNode(node) => node.as_str(),
            GraphError::DeadlineExceeded { .. } => "deadline",
            GraphError::Llm { .. } => "llm",
            GraphError::Channel(_) => "events",
            GraphError::Serialization(_) | GraphError::Validation(_) => "runtime",
        }
    }

    /// Convenience constructor for a node failure
    pub fn node(node: NodeKind, message: impl Into<String>, retryable: bool) -> Self {
        GraphError::Node {
            node,
            message: message.into(),
            retryable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GraphError::node(NodeKind::Retrieval, "5xx", true).is_retryable());
        assert!(!GraphError::node(NodeKind::Router, "bad output", false).is_retryable());
        assert!(GraphError::NodeTimeout {
            node: NodeKind::Generator,
            timeout: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(!GraphError::DeadlineExceeded {
            deadline: Duration::from_secs(600)
        }
        .is_retryable());
    }

    #[test]
    fn test_stage_names() {
        let err = GraphError::node(NodeKind::Critic, "x", false);
        assert_eq!(err.stage(), "critic");

        let err = GraphError::Validation("bad".to_string());
        assert_eq!(err.stage(), "runtime");
    }
}
