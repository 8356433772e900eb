//! Agent node abstraction and registry

use crate::error::{GraphError, Result};
use crate::graph::NodeKind;
use crate::state::{AgentState, StateDelta};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// One stage of the pipeline
///
/// Nodes read the state and return a partial delta. They must not mutate
/// shared state, and failures are returned as errors rather than panics;
/// the runtime decides whether to retry or transition to the error terminal.
#[async_trait]
pub trait AgentNode: Send + Sync {
    /// Which stage this node implements
    fn kind(&self) -> NodeKind;

    /// Execute the node against the current state
    async fn run(&self, state: &AgentState) -> Result<StateDelta>;
}

/// Name → implementation table for the pipeline's nodes
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeKind, Arc<dyn AgentNode>>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node implementation under its own kind
    pub fn register(&mut self, node: Arc<dyn AgentNode>) -> &mut Self {
        self.nodes.insert(node.kind(), node);
        self
    }

    /// Look up the implementation for a node kind
    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn AgentNode>> {
        self.nodes.get(&kind).cloned()
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ensure every stage of the graph has an implementation
    pub fn validate(&self) -> Result<()> {
        for kind in NodeKind::ALL {
            if !self.nodes.contains_key(&kind) {
                return Err(GraphError::MissingNode(kind));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopNode(NodeKind);

    #[async_trait]
    impl AgentNode for NoopNode {
        fn kind(&self) -> NodeKind {
            self.0
        }

        async fn run(&self, _state: &AgentState) -> Result<StateDelta> {
            Ok(StateDelta::new())
        }
    }

    #[test]
    fn test_validate_rejects_partial_registry() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(NoopNode(NodeKind::Router)));

        match registry.validate() {
            Err(GraphError::MissingNode(_)) => {}
            other => panic!("expected MissingNode, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_validate_accepts_full_registry() {
        let mut registry = NodeRegistry::new();
        for kind in NodeKind::ALL {
            registry.register(Arc::new(NoopNode(kind)));
        }
        assert!(registry.validate().is_ok());
        assert_eq!(registry.len(), 8);
    }
}
