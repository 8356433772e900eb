//! Core types and graph runtime for the relay pipeline
//!
//! This crate defines the shared data model of a pipeline run and the
//! executor that drives it:
//!
//! - [`AgentState`] - the single record carried through a run; nodes return
//!   partial [`StateDelta`] updates that are merged into it
//! - [`Message`] / [`Role`] - conversation history entries
//! - [`PipelineEvent`] - the events a run emits, with their SSE wire encoding
//! - [`NodeKind`] and [`next_node`] - the fixed pipeline graph as an explicit
//!   state machine with a pure transition function
//! - [`AgentNode`] / [`NodeRegistry`] - the per-stage node abstraction
//! - [`GraphRunner`] - the executor: per-node timeouts, bounded node retry,
//!   a whole-job deadline, event emission and a checkpoint hook
//! - [`llm::ChatModel`] - the language model client boundary; provider
//!   implementations live in the `llm` crate
//!
//! The graph shape is fixed at compile time:
//!
//! ```text
//! router → planner → retrieval → generator → critic → translator → summarize → finalize
//!    \________(calculator / direct answer / translate)________↗       ↑
//!                       generator ⇄ critic revision loop (bounded) ___|
//! ```

pub mod error;
pub mod event;
pub mod graph;
pub mod llm;
pub mod messages;
pub mod node;
pub mod runtime;
pub mod state;

pub use error::{GraphError, Result};
pub use event::{CompletedState, PipelineEvent};
pub use graph::{next_node, NodeKind};
pub use messages::{Message, Role};
pub use node::{AgentNode, NodeRegistry};
pub use runtime::{
    ChannelSink, CheckpointHook, EventSink, GraphRunner, NoopCheckpointHook, RunLimits,
    NO_ANSWER_STUB,
};
pub use state::{
    AgentState, Critique, Evidence, RoutingDecision, RunFailure, StateDelta, ToolKind, Verdict,
};
