//! Critic node
//!
//! Judges the current draft. `rejected` is reserved for safety or policy
//! violations; quality problems come back as `needs_revision` with concrete
//! instructions. A reply that cannot be parsed counts as approval, so a
//! misbehaving critic model can degrade quality but never wedge the run.

use super::extract_json;
use async_trait::async_trait;
use relay_core::llm::{ChatMessage, ChatModel, ChatRequest};
use relay_core::{AgentNode, AgentState, Critique, NodeKind, Result, StateDelta, Verdict};
use std::sync::Arc;

const CRITIC_SYSTEM: &str = "You review draft answers. Reply with JSON only: \
{\"verdict\": \"approved\" | \"needs_revision\" | \"rejected\", \"reasons\": [\"...\"], \
\"instructions\": \"...\"}. Use rejected ONLY for safety or policy violations. Use \
needs_revision for answers that are wrong, unsupported by the evidence, or unclear, \
and give actionable instructions.";

/// Draft review node
pub struct CriticNode {
    llm: Arc<dyn ChatModel>,
}

impl CriticNode {
    /// Create the critic
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }

    fn parse_verdict(raw: &str) -> Option<Verdict> {
        match raw.trim().to_lowercase().as_str() {
            "approved" | "approve" => Some(Verdict::Approved),
            "needs_revision" | "needs revision" | "revise" => Some(Verdict::NeedsRevision),
            "rejected" | "reject" => Some(Verdict::Rejected),
            _ => None,
        }
    }

    fn parse_critique(content: &str) -> Option<Critique> {
        let value = extract_json(content)?;
        let verdict = Self::parse_verdict(value.get("verdict")?.as_str()?)?;
        let reasons = value
            .get("reasons")
            .and_then(|r| r.as_array())
            .map(|reasons| {
                reasons
                    .iter()
                    .filter_map(|reason| reason.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let instructions = value
            .get("instructions")
            .and_then(|i| i.as_str())
            .unwrap_or_default()
            .to_string();

        Some(Critique {
            verdict,
            reasons,
            instructions,
        })
    }
}

#[async_trait]
impl AgentNode for CriticNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Critic
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        let draft = state.draft_answer.as_deref().unwrap_or_default();

        let mut prompt = format!("Question: {}\n\nDraft answer:\n{}\n", state.query, draft);
        if !state.retrieved_context.is_empty() {
            prompt.push_str("\nEvidence the draft should be grounded in:\n");
            for (i, evidence) in state.retrieved_context.iter().enumerate() {
                prompt.push_str(&format!("[{}] {}\n", i + 1, evidence.text));
            }
        }

        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_system(CRITIC_SYSTEM);
        let response = self.llm.chat(request).await?;

        let critique = match Self::parse_critique(&response.content) {
            Some(critique) => critique,
            None => {
                tracing::warn!("Critic reply was not parseable; treating as approval");
                Critique::approved()
            }
        };

        Ok(StateDelta::new().with_critique(critique))
    }
}
