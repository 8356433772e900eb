//! Planner node
//!
//! Produces the intent and a short ordered plan for retrieval-backed
//! routings. Calculator, translate and direct-answer routings never reach
//! this node, but it degrades to a no-op if they do.

use super::{context_block, extract_json, NodeSettings};
use async_trait::async_trait;
use relay_core::llm::{ChatMessage, ChatModel, ChatRequest};
use relay_core::{AgentNode, AgentState, NodeKind, Result, StateDelta};
use std::sync::Arc;

/// Intent and plan production node
pub struct PlannerNode {
    llm: Arc<dyn ChatModel>,
    settings: NodeSettings,
}

impl PlannerNode {
    /// Create the planner
    pub fn new(llm: Arc<dyn ChatModel>, settings: NodeSettings) -> Self {
        Self { llm, settings }
    }
}

#[async_trait]
impl AgentNode for PlannerNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Planner
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        if state
            .routing_decision
            .as_ref()
            .map(|d| d.tool.skips_retrieval())
            .unwrap_or(false)
        {
            return Ok(StateDelta::new());
        }

        let prompt = format!(
            "{}State the user's intent in one sentence, then list the steps \
             needed to answer.\n\nQuestion: {}\n\n\
             Reply with JSON only: {{\"intent\": \"<sentence>\", \"plan\": [\"<step>\", ...]}}. \
             Keep the plan to at most four steps.",
            context_block(state, self.settings.keep_recent),
            state.query,
        );

        let response = self
            .llm
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;

        let parsed = extract_json(&response.content).and_then(|value| {
            let intent = value.get("intent")?.as_str()?.to_string();
            let plan = value
                .get("plan")?
                .as_array()?
                .iter()
                .filter_map(|step| step.as_str().map(str::to_string))
                .collect::<Vec<_>>();
            Some((intent, plan))
        });

        let (intent, plan) = match parsed {
            Some(parsed) => parsed,
            None => {
                tracing::warn!("Planner reply was not parseable; using a trivial plan");
                (
                    state.query.clone(),
                    vec!["answer the question directly".to_string()],
                )
            }
        };

        Ok(StateDelta::new().with_intent(intent).with_plan(plan))
    }
}
