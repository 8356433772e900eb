//! Pipeline events and their SSE wire encoding
//!
//! Every run emits `connected`, a sequence of `node`/`state_delta` events and
//! exactly one terminal `complete` or `error`. [`PipelineEvent::to_wire`]
//! produces the JSON object placed on an SSE `data:` line.

use crate::graph::NodeKind;
use crate::state::{AgentState, RoutingDecision, StateDelta};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Selected state fields carried on the terminal `complete` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedState {
    /// The answer delivered to the user
    pub final_answer: String,
    /// Router output for this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    /// Planner's reading of the query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Session summary after the run
    pub summary: String,
    /// Revisions taken by the generator/critic loop
    pub revision_count: u32,
}

impl CompletedState {
    /// Extract the completion payload from a finished run
    pub fn from_state(state: &AgentState) -> Self {
        Self {
            final_answer: state.final_answer.clone().unwrap_or_default(),
            routing_decision: state.routing_decision.clone(),
            intent: state.intent.clone(),
            summary: state.summary.clone(),
            revision_count: state.revision_count,
        }
    }
}

/// An event observed on a request's stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Stream opened for the request
    Connected,
    /// Execution entered a node
    Node {
        /// The node being entered
        node: NodeKind,
    },
    /// A node produced a state update
    StateDelta {
        /// The node that produced the update
        node: NodeKind,
        /// Only the fields that changed
        delta: StateDelta,
    },
    /// The run failed; no further events follow
    Error {
        /// Node (or runtime stage) where the failure occurred
        stage: String,
        /// Human-readable description
        error: String,
    },
    /// The run finished; no further events follow
    Complete {
        /// Selected final state fields
        state: CompletedState,
    },
}

impl PipelineEvent {
    /// Event kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::Connected => "connected",
            PipelineEvent::Node { .. } => "node",
            PipelineEvent::StateDelta { .. } => "state_delta",
            PipelineEvent::Error { .. } => "error",
            PipelineEvent::Complete { .. } => "complete",
        }
    }

    /// Whether this event closes the stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::Error { .. } | PipelineEvent::Complete { .. }
        )
    }

    /// JSON object for the SSE `data:` line
    pub fn to_wire(&self) -> Value {
        match self {
            PipelineEvent::Connected => json!({"event": "connected"}),
            PipelineEvent::Node { node } => json!({"event": "node", "node": node.as_str()}),
            PipelineEvent::StateDelta { node, delta } => {
                json!({"node": node.as_str(), "state": delta})
            }
            PipelineEvent::Error { stage, error } => {
                json!({"event": "error", "error": error, "stage": stage})
            }
            PipelineEvent::Complete { state } => json!({"event": "complete", "state": state}),
        }
    }

    /// Convenience constructor for a terminal error event
    pub fn error(stage: impl Into<String>, error: impl Into<String>) -> Self {
        PipelineEvent::Error {
            stage: stage.into(),
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_wire_format() {
        let wire = PipelineEvent::Connected.to_wire();
        assert_eq!(wire, json!({"event": "connected"}));
    }

    #[test]
    fn test_state_delta_wire_format() {
        let event = PipelineEvent::StateDelta {
            node: NodeKind::Generator,
            delta: StateDelta::new().with_draft_answer("225"),
        };
        let wire = event.to_wire();
        assert_eq!(wire["node"], "generator");
        assert_eq!(wire["state"]["draft_answer"], "225");
    }

    #[test]
    fn test_error_wire_format() {
        let event = PipelineEvent::error("retrieval", "backend unavailable");
        let wire = event.to_wire();
        assert_eq!(wire["event"], "error");
        assert_eq!(wire["stage"], "retrieval");
    }

    #[test]
    fn test_terminal_classification() {
        assert!(PipelineEvent::error("x", "y").is_terminal());
        assert!(!PipelineEvent::Connected.is_terminal());
        assert!(!PipelineEvent::Node {
            node: NodeKind::Router
        }
        .is_terminal());
    }

    #[test]
    fn test_complete_carries_final_answer() {
        let mut state = AgentState::new("what is 15% of 1500?", "en");
        state.final_answer = Some("15% of 1500 is 225".to_string());
        let event = PipelineEvent::Complete {
            state: CompletedState::from_state(&state),
        };

        let wire = event.to_wire();
        assert_eq!(wire["event"], "complete");
        assert!(wire["state"]["final_answer"]
            .as_str()
            .unwrap()
            .contains("225"));
    }
}
