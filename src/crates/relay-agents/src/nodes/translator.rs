//! Translator node
//!
//! Renders the approved draft in the session's target language. Identity
//! when the target already is the base language (the transition function
//! bypasses the node in that case; the guard here keeps the node safe to
//! call regardless).

use super::NodeSettings;
use async_trait::async_trait;
use relay_core::llm::{ChatMessage, ChatModel, ChatRequest};
use relay_core::{AgentNode, AgentState, GraphError, NodeKind, Result, StateDelta};
use std::sync::Arc;

/// Target-language rendering node
pub struct TranslatorNode {
    llm: Arc<dyn ChatModel>,
    settings: NodeSettings,
}

impl TranslatorNode {
    /// Create the translator
    pub fn new(llm: Arc<dyn ChatModel>, settings: NodeSettings) -> Self {
        Self { llm, settings }
    }
}

#[async_trait]
impl AgentNode for TranslatorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Translator
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        if state
            .target_language
            .eq_ignore_ascii_case(&self.settings.base_language)
        {
            return Ok(StateDelta::new());
        }

        let draft = state.draft_answer.as_ref().ok_or_else(|| {
            GraphError::node(NodeKind::Translator, "no draft answer to translate", false)
        })?;

        let prompt = format!(
            "Translate the following answer into {}. Reply with the translation only.\n\n{}",
            state.target_language, draft
        );
        let response = self
            .llm
            .chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;

        Ok(StateDelta::new().with_draft_answer(response.content.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::ScriptedChatModel;

    #[tokio::test]
    async fn test_identity_for_base_language() {
        let llm = Arc::new(ScriptedChatModel::empty());
        let node = TranslatorNode::new(llm.clone(), NodeSettings::default());

        let mut state = AgentState::new("q", "en");
        state.draft_answer = Some("an answer".to_string());

        let delta = node.run(&state).await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_translates_draft() {
        let llm = Arc::new(ScriptedChatModel::new(vec!["une réponse"]));
        let node = TranslatorNode::new(llm, NodeSettings::default());

        let mut state = AgentState::new("q", "fr");
        state.draft_answer = Some("an answer".to_string());

        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.draft_answer.as_deref(), Some("une réponse"));
    }

    #[tokio::test]
    async fn test_missing_draft_is_fatal() {
        let llm = Arc::new(ScriptedChatModel::empty());
        let node = TranslatorNode::new(llm, NodeSettings::default());

        let state = AgentState::new("q", "fr");
        let err = node.run(&state).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
