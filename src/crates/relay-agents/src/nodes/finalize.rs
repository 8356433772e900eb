//! Finalize node
//!
//! Publishes the surviving draft as the final answer. When the run exhausted
//! its budgets without ever producing a draft, a fixed apology is used so the
//! terminal event always carries an answer.

use async_trait::async_trait;
use relay_core::{AgentNode, AgentState, NodeKind, Result, StateDelta, NO_ANSWER_STUB};

/// Terminal node
#[derive(Default)]
pub struct FinalizeNode;

impl FinalizeNode {
    /// Create the finalize node
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentNode for FinalizeNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Finalize
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        let answer = state
            .draft_answer
            .clone()
            .unwrap_or_else(|| NO_ANSWER_STUB.to_string());
        Ok(StateDelta::new().with_final_answer(answer))
    }
}
