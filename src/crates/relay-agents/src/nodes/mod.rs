//! Pipeline node implementations
//!
//! Each node consumes the run state and returns a partial delta. Failures are
//! surfaced as [`relay_core::GraphError`] values; the runtime decides whether
//! to retry or terminate. Nodes that call a language model parse its output
//! leniently and fall back to conservative defaults rather than failing the
//! run on malformed JSON.

pub mod critic;
pub mod finalize;
pub mod generator;
pub mod planner;
pub mod retrieval;
pub mod router;
pub mod summarize;
pub mod translator;

pub use critic::CriticNode;
pub use finalize::FinalizeNode;
pub use generator::GeneratorNode;
pub use planner::PlannerNode;
pub use retrieval::RetrievalNode;
pub use router::RouterNode;
pub use summarize::SummarizeNode;
pub use translator::TranslatorNode;

use crate::summarizer::Summarizer;
use crate::tools::ToolRegistry;
use relay_core::llm::ChatModel;
use relay_core::{AgentState, NodeRegistry};
use std::sync::Arc;

/// Settings shared by prompt-building nodes
#[derive(Debug, Clone)]
pub struct NodeSettings {
    /// Trailing messages passed as prompt context
    pub keep_recent: usize,
    /// Language drafts are produced in
    pub base_language: String,
    /// Re-dispatch empty internal retrieval to web search
    pub fallback_web_on_empty_retrieval: bool,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            keep_recent: 4,
            base_language: "en".to_string(),
            fallback_web_on_empty_retrieval: true,
        }
    }
}

/// Wire a complete node registry for the runtime
pub fn build_registry(
    llm: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    summarizer: Arc<Summarizer>,
    settings: NodeSettings,
) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(RouterNode::new(
        llm.clone(),
        tools.clone(),
        settings.clone(),
    )));
    registry.register(Arc::new(PlannerNode::new(llm.clone(), settings.clone())));
    registry.register(Arc::new(RetrievalNode::new(tools.clone(), settings.clone())));
    registry.register(Arc::new(GeneratorNode::new(
        llm.clone(),
        tools,
        settings.clone(),
    )));
    registry.register(Arc::new(CriticNode::new(llm.clone())));
    registry.register(Arc::new(TranslatorNode::new(llm, settings)));
    registry.register(Arc::new(SummarizeNode::new(summarizer)));
    registry.register(Arc::new(FinalizeNode::new()));
    registry
}

/// Extract a JSON object from an LLM reply, tolerating code fences and prose
pub(crate) fn extract_json(content: &str) -> Option<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(content.trim()) {
        return Some(value);
    }
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

/// Render the prompt context for a run: rolling summary plus recent turns
pub(crate) fn context_block(state: &AgentState, keep_recent: usize) -> String {
    let mut block = String::new();
    if !state.summary.is_empty() {
        block.push_str("Conversation summary:\n");
        block.push_str(&state.summary);
        block.push_str("\n\n");
    }
    let recent = state.recent_history(keep_recent);
    if !recent.is_empty() {
        block.push_str("Recent conversation:\n");
        for message in recent {
            block.push_str(&format!("{}: {}\n", message.role.as_str(), message.content));
        }
        block.push('\n');
    }
    block
}
