//! Retrieval node
//!
//! The one impure stage of the graph: dispatches to the tool registry based
//! on the routing decision. An empty internal retrieval result is re-dispatched
//! to web search once per turn when the fallback flag is enabled, and the
//! routing decision is updated to record what actually produced the evidence.

use super::NodeSettings;
use crate::tools::{ToolError, ToolOptions, ToolRegistry};
use async_trait::async_trait;
use relay_core::{
    AgentNode, AgentState, GraphError, NodeKind, Result, RoutingDecision, StateDelta, ToolKind,
};
use std::sync::Arc;

/// Evidence-gathering node
pub struct RetrievalNode {
    tools: Arc<ToolRegistry>,
    settings: NodeSettings,
}

impl RetrievalNode {
    /// Create the retrieval node
    pub fn new(tools: Arc<ToolRegistry>, settings: NodeSettings) -> Self {
        Self { tools, settings }
    }

    fn map_error(error: ToolError) -> GraphError {
        let retryable = error.is_retryable();
        GraphError::node(NodeKind::Retrieval, error.to_string(), retryable)
    }
}

#[async_trait]
impl AgentNode for RetrievalNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Retrieval
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        let decision = state.routing_decision.as_ref().ok_or_else(|| {
            GraphError::node(NodeKind::Retrieval, "no routing decision in state", false)
        })?;

        let mut options = ToolOptions::default();
        if let Some(target) = &decision.target {
            options = options.with_target(target.clone());
        }

        let evidence = self
            .tools
            .run_tool(decision.tool, &state.query, &options)
            .await
            .map_err(Self::map_error)?;

        if evidence.is_empty()
            && decision.tool == ToolKind::InternalRetrieval
            && self.settings.fallback_web_on_empty_retrieval
            && self.tools.is_configured(ToolKind::WebSearch)
        {
            tracing::info!("Internal retrieval came back empty; falling back to web search");
            let web_evidence = self
                .tools
                .run_tool(ToolKind::WebSearch, &state.query, &options)
                .await
                .map_err(Self::map_error)?;

            let updated = RoutingDecision::new(
                ToolKind::WebSearch,
                format!(
                    "{}; fell back to web search after empty internal retrieval",
                    decision.reasoning
                ),
            );
            return Ok(StateDelta::new()
                .with_retrieved_context(web_evidence)
                .with_routing_decision(updated));
        }

        Ok(StateDelta::new().with_retrieved_context(evidence))
    }
}
