//! Summarize node
//!
//! Refreshes the session summary at the end of a run. Summarizer failures are
//! soft: they leave the previous summary in place and record a warning
//! instead of failing the run.

use crate::summarizer::Summarizer;
use async_trait::async_trait;
use relay_core::{AgentNode, AgentState, NodeKind, Result, StateDelta};
use std::sync::Arc;

/// Summary refresh node
pub struct SummarizeNode {
    summarizer: Arc<Summarizer>,
}

impl SummarizeNode {
    /// Create the summarize node
    pub fn new(summarizer: Arc<Summarizer>) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl AgentNode for SummarizeNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Summarize
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        match self
            .summarizer
            .summarize(&state.chat_history, &state.summary)
            .await
        {
            Ok(Some(outcome)) => {
                tracing::debug!(
                    mode = ?outcome.mode,
                    chunks = outcome.chunk_summaries.len(),
                    "Summary refreshed"
                );
                Ok(StateDelta::new().with_summary(outcome.summary))
            }
            Ok(None) => Ok(StateDelta::new()),
            Err(e) => {
                tracing::warn!(error = %e, "Summarizer failed; keeping previous summary");
                Ok(StateDelta::new().with_warning(format!("summarizer failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::SummarizerConfig;
    use llm::ScriptedChatModel;
    use relay_core::Message;

    fn node_with(model: ScriptedChatModel) -> SummarizeNode {
        SummarizeNode::new(Arc::new(Summarizer::new(
            Arc::new(model),
            SummarizerConfig::default(),
        )))
    }

    fn long_history(state: &mut AgentState, pairs: usize) {
        for i in 0..pairs {
            state.chat_history.push(Message::user(format!("q{}", i)));
            state.chat_history.push(Message::assistant(format!("a{}", i)));
        }
    }

    #[tokio::test]
    async fn test_short_history_is_skipped() {
        let node = node_with(ScriptedChatModel::empty());
        let state = AgentState::new("q", "en");
        let delta = node.run(&state).await.unwrap();
        assert!(delta.is_empty());
    }

    #[tokio::test]
    async fn test_long_history_refreshes_summary() {
        let node = node_with(ScriptedChatModel::new(vec!["updated summary"]));
        let mut state = AgentState::new("q", "en");
        long_history(&mut state, 8);

        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.summary.as_deref(), Some("updated summary"));
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_soft() {
        let model = ScriptedChatModel::empty().with_fallback(None);
        let node = node_with(model);
        let mut state = AgentState::new("q", "en");
        long_history(&mut state, 8);

        let delta = node.run(&state).await.unwrap();
        assert!(delta.summary.is_none());
        assert!(delta.warning.unwrap().contains("summarizer failed"));
    }
}
