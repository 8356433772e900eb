//! The pipeline graph as an explicit state machine
//!
//! The graph is fixed: an enum of nodes plus a pure transition function over
//! `(current node, state)`. Conditional edges are plain `match` arms, which
//! keeps routing exhaustive and lets the runtime enforce per-node budgets.

use crate::state::{AgentState, ToolKind, Verdict};
use serde::{Deserialize, Serialize};

/// Stages of the pipeline, in graph order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Choose a tool for the query
    Router,
    /// Produce intent and an ordered plan
    Planner,
    /// Gather evidence via the tool adapters
    Retrieval,
    /// Draft an answer (and incorporate critique on revision)
    Generator,
    /// Judge the draft
    Critic,
    /// Render the draft in the target language
    Translator,
    /// Refresh the conversation summary
    Summarize,
    /// Publish the final answer
    Finalize,
}

impl NodeKind {
    /// Node name as used in events and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Router => "router",
            NodeKind::Planner => "planner",
            NodeKind::Retrieval => "retrieval",
            NodeKind::Generator => "generator",
            NodeKind::Critic => "critic",
            NodeKind::Translator => "translator",
            NodeKind::Summarize => "summarize",
            NodeKind::Finalize => "finalize",
        }
    }

    /// All nodes, in graph order
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Router,
        NodeKind::Planner,
        NodeKind::Retrieval,
        NodeKind::Generator,
        NodeKind::Critic,
        NodeKind::Translator,
        NodeKind::Summarize,
        NodeKind::Finalize,
    ];
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the node following `current`, or `None` on the terminal node
///
/// Conditional edges:
/// - after `router`: calculator, direct_answer and translate routings skip
///   planner and retrieval
/// - after `critic`: `needs_revision` loops back to the generator while
///   `revision_count < max_revisions`; the runtime increments the counter
///   when it takes that edge
/// - the translator is bypassed when the target language already is the
///   base language
pub fn next_node(
    current: NodeKind,
    state: &AgentState,
    max_revisions: u32,
    base_language: &str,
) -> Option<NodeKind> {
    match current {
        NodeKind::Router => {
            let tool = state
                .routing_decision
                .as_ref()
                .map(|d| d.tool)
                .unwrap_or(ToolKind::DirectAnswer);
            if tool.skips_retrieval() {
                Some(NodeKind::Generator)
            } else {
                Some(NodeKind::Planner)
            }
        }
        NodeKind::Planner => Some(NodeKind::Retrieval),
        NodeKind::Retrieval => Some(NodeKind::Generator),
        NodeKind::Generator => Some(NodeKind::Critic),
        NodeKind::Critic => {
            let verdict = state
                .critique
                .as_ref()
                .map(|c| c.verdict)
                .unwrap_or(Verdict::Approved);
            if verdict == Verdict::NeedsRevision && state.revision_count < max_revisions {
                Some(NodeKind::Generator)
            } else if state.target_language.eq_ignore_ascii_case(base_language) {
                Some(NodeKind::Summarize)
            } else {
                Some(NodeKind::Translator)
            }
        }
        NodeKind::Translator => Some(NodeKind::Summarize),
        NodeKind::Summarize => Some(NodeKind::Finalize),
        NodeKind::Finalize => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Critique, RoutingDecision};

    fn state_with_tool(tool: ToolKind) -> AgentState {
        let mut state = AgentState::new("q", "en");
        state.routing_decision = Some(RoutingDecision::new(tool, "test"));
        state
    }

    #[test]
    fn test_router_skips_planner_for_calculator() {
        let state = state_with_tool(ToolKind::Calculator);
        assert_eq!(
            next_node(NodeKind::Router, &state, 2, "en"),
            Some(NodeKind::Generator)
        );
    }

    #[test]
    fn test_router_goes_to_planner_for_search() {
        let state = state_with_tool(ToolKind::WebSearch);
        assert_eq!(
            next_node(NodeKind::Router, &state, 2, "en"),
            Some(NodeKind::Planner)
        );
    }

    #[test]
    fn test_critic_revision_loop_bounded() {
        let mut state = state_with_tool(ToolKind::DirectAnswer);
        state.critique = Some(Critique {
            verdict: Verdict::NeedsRevision,
            reasons: vec!["too vague".to_string()],
            instructions: "add detail".to_string(),
        });

        state.revision_count = 0;
        assert_eq!(
            next_node(NodeKind::Critic, &state, 2, "en"),
            Some(NodeKind::Generator)
        );

        state.revision_count = 2;
        assert_eq!(
            next_node(NodeKind::Critic, &state, 2, "en"),
            Some(NodeKind::Summarize)
        );
    }

    #[test]
    fn test_translator_bypassed_for_base_language() {
        let mut state = state_with_tool(ToolKind::DirectAnswer);
        state.critique = Some(Critique::approved());

        assert_eq!(
            next_node(NodeKind::Critic, &state, 2, "en"),
            Some(NodeKind::Summarize)
        );

        state.target_language = "fr".to_string();
        assert_eq!(
            next_node(NodeKind::Critic, &state, 2, "en"),
            Some(NodeKind::Translator)
        );
    }

    #[test]
    fn test_finalize_is_terminal() {
        let state = state_with_tool(ToolKind::DirectAnswer);
        assert_eq!(next_node(NodeKind::Finalize, &state, 2, "en"), None);
    }

    #[test]
    fn test_full_path_for_search_routing() {
        let mut state = state_with_tool(ToolKind::WebSearch);
        state.critique = Some(Critique::approved());

        let mut path = vec![NodeKind::Router];
        let mut current = NodeKind::Router;
        while let Some(next) = next_node(current, &state, 2, "en") {
            path.push(next);
            current = next;
        }

        assert_eq!(
            path,
            vec![
                NodeKind::Router,
                NodeKind::Planner,
                NodeKind::Retrieval,
                NodeKind::Generator,
                NodeKind::Critic,
                NodeKind::Summarize,
                NodeKind::Finalize,
            ]
        );
    }
}
