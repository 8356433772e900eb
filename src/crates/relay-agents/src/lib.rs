//! Agent node implementations, conversation summarizer and tool adapters
//!
//! This crate supplies the behavior plugged into the `relay-core` graph:
//!
//! - [`nodes`] - the eight pipeline stages as [`relay_core::AgentNode`]
//!   implementations, each a pure function over state except retrieval,
//!   which dispatches to the tool adapters
//! - [`summarizer`] - standard and hierarchical conversation summarization
//! - [`tools`] - a uniform adapter interface over web search, targeted
//!   crawling, internal retrieval and the in-process calculator, with
//!   per-call timeout and bounded retry
//!
//! [`build_registry`] wires a complete node set for the runtime.

pub mod nodes;
pub mod summarizer;
pub mod tools;

pub use nodes::{build_registry, NodeSettings};
pub use summarizer::{Summarizer, SummarizerConfig, SummaryMode, SummaryOutcome};
pub use tools::{
    AdapterSettings, CalculatorAdapter, InternalRetrievalAdapter, KeywordRetriever,
    RetrieverBackend, SearchConfig, TargetedCrawlAdapter, ToolAdapter, ToolError, ToolOptions,
    ToolRegistry, WebSearchAdapter,
};
