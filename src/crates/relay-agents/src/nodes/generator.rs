//! Generator node
//!
//! Drafts the answer. On the calculator route the in-process evaluator is
//! invoked directly (the graph skips retrieval for that routing); every other
//! route goes through the language model with the evidence block, and on
//! revision the critic's instructions are folded into the prompt.

use super::{context_block, NodeSettings};
use crate::tools::{ToolOptions, ToolRegistry};
use async_trait::async_trait;
use regex::Regex;
use relay_core::llm::{ChatMessage, ChatModel, ChatRequest};
use relay_core::{AgentNode, AgentState, NodeKind, Result, StateDelta, ToolKind};
use std::sync::{Arc, OnceLock};

const GENERATOR_SYSTEM: &str = "You are the answer generator of a question answering \
pipeline. Ground your answer in the provided evidence and cite evidence items inline \
as [1], [2] and so on. If no evidence is provided, answer from general knowledge and \
say so when you are unsure.";

fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("valid regex"))
}

/// Answer drafting node
pub struct GeneratorNode {
    llm: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    settings: NodeSettings,
}

impl GeneratorNode {
    /// Create the generator
    pub fn new(llm: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, settings: NodeSettings) -> Self {
        Self {
            llm,
            tools,
            settings,
        }
    }

    /// Citations referenced by the draft, as indices into the evidence list
    fn extract_citations(draft: &str, evidence_count: usize) -> Vec<usize> {
        let mut citations: Vec<usize> = citation_regex()
            .captures_iter(draft)
            .filter_map(|cap| cap[1].parse::<usize>().ok())
            .filter(|n| *n >= 1 && *n <= evidence_count)
            .map(|n| n - 1)
            .collect();
        citations.sort_unstable();
        citations.dedup();
        citations
    }

    async fn calculator_draft(&self, state: &AgentState) -> Option<String> {
        let evidence = self
            .tools
            .run_tool(ToolKind::Calculator, &state.query, &ToolOptions::default())
            .await
            .ok()?;
        let result = evidence.first()?;
        Some(format!("The answer is {}.", result.text))
    }

    async fn llm_draft(&self, state: &AgentState) -> Result<String> {
        let mut prompt = context_block(state, self.settings.keep_recent);

        if let Some(intent) = &state.intent {
            prompt.push_str(&format!("Intent: {}\n", intent));
        }
        if !state.plan.is_empty() {
            prompt.push_str(&format!("Plan: {}\n", state.plan.join("; ")));
        }
        if !state.retrieved_context.is_empty() {
            prompt.push_str("\nEvidence:\n");
            for (i, evidence) in state.retrieved_context.iter().enumerate() {
                prompt.push_str(&format!("[{}] {} ({})\n", i + 1, evidence.text, evidence.source));
            }
        }

        prompt.push_str(&format!("\nQuestion: {}\n", state.query));

        if state.revision_count > 0 {
            if let (Some(draft), Some(critique)) = (&state.draft_answer, &state.critique) {
                prompt.push_str(&format!(
                    "\nYour previous draft:\n{}\n\nReviewer feedback:\n{}\n{}\n\
                     Write an improved answer that addresses the feedback.\n",
                    draft,
                    critique.reasons.join("; "),
                    critique.instructions,
                ));
            }
        }

        let request =
            ChatRequest::new(vec![ChatMessage::user(prompt)]).with_system(GENERATOR_SYSTEM);
        let response = self.llm.chat(request).await?;
        Ok(response.content.trim().to_string())
    }
}

#[async_trait]
impl AgentNode for GeneratorNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Generator
    }

    async fn run(&self, state: &AgentState) -> Result<StateDelta> {
        let tool = state.routing_decision.as_ref().map(|d| d.tool);

        let draft = if tool == Some(ToolKind::Calculator) {
            match self.calculator_draft(state).await {
                Some(draft) => draft,
                // Not actually computable; fall through to the model.
                None => self.llm_draft(state).await?,
            }
        } else {
            self.llm_draft(state).await?
        };

        let citations = Self::extract_citations(&draft, state.retrieved_context.len());
        Ok(StateDelta::new()
            .with_draft_answer(draft)
            .with_citations(citations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{AdapterSettings, CalculatorAdapter};
    use llm::ScriptedChatModel;
    use relay_core::{Critique, Evidence, RoutingDecision, Verdict};

    fn tools() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new(AdapterSettings::default());
        registry.register(Arc::new(CalculatorAdapter::new()));
        Arc::new(registry)
    }

    fn generator(llm: Arc<ScriptedChatModel>) -> GeneratorNode {
        GeneratorNode::new(llm, tools(), NodeSettings::default())
    }

    #[tokio::test]
    async fn test_calculator_route_evaluates_locally() {
        let llm = Arc::new(ScriptedChatModel::empty());
        let node = generator(llm.clone());

        let mut state = AgentState::new("What is 15% of 1500?", "en");
        state.routing_decision = Some(RoutingDecision::new(ToolKind::Calculator, "math"));

        let delta = node.run(&state).await.unwrap();
        assert!(delta.draft_answer.unwrap().contains("225"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_evidence_is_numbered_and_cited() {
        let llm = Arc::new(ScriptedChatModel::new(vec![
            "Rust uses ownership [1] and borrowing [2].",
        ]));
        let node = generator(llm.clone());

        let mut state = AgentState::new("how does rust manage memory", "en");
        state.routing_decision = Some(RoutingDecision::new(ToolKind::WebSearch, "search"));
        state.retrieved_context = vec![
            Evidence::new("ownership rules", "a"),
            Evidence::new("borrow checker", "b"),
        ];

        let delta = node.run(&state).await.unwrap();
        assert_eq!(delta.citations.unwrap(), vec![0, 1]);

        let prompt = &llm.requests()[0].messages[1].content;
        assert!(prompt.contains("[1] ownership rules"));
        assert!(prompt.contains("[2] borrow checker"));
    }

    #[tokio::test]
    async fn test_out_of_range_citations_are_dropped() {
        assert_eq!(
            GeneratorNode::extract_citations("see [1] and [7] and [0]", 2),
            vec![0]
        );
    }

    #[tokio::test]
    async fn test_revision_prompt_includes_critique() {
        let llm = Arc::new(ScriptedChatModel::new(vec!["a better answer"]));
        let node = generator(llm.clone());

        let mut state = AgentState::new("explain lifetimes", "en");
        state.routing_decision = Some(RoutingDecision::new(ToolKind::DirectAnswer, "direct"));
        state.revision_count = 1;
        state.draft_answer = Some("a vague answer".to_string());
        state.critique = Some(Critique {
            verdict: Verdict::NeedsRevision,
            reasons: vec!["too vague".to_string()],
            instructions: "give a concrete example".to_string(),
        });

        node.run(&state).await.unwrap();
        let prompt = &llm.requests()[0].messages[1].content;
        assert!(prompt.contains("a vague answer"));
        assert!(prompt.contains("give a concrete example"));
    }
}
