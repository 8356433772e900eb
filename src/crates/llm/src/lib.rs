//! Language model client implementations for relay
//!
//! This crate provides concrete implementations of the `ChatModel` trait from
//! `relay-core`:
//!
//! - [`OpenAiClient`] - OpenAI-compatible chat completions over HTTP, used
//!   against api.openai.com or any compatible gateway
//! - [`ScriptedChatModel`] - a deterministic test double that replays canned
//!   responses in order and records the requests it served
//!
//! Clients are cheap handles; construct one per run and share it across
//! nodes as `Arc<dyn ChatModel>`.

pub mod config;
pub mod error;
pub mod openai;
pub mod scripted;

pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use openai::OpenAiClient;
pub use scripted::ScriptedChatModel;

// Re-export the trait and request types for convenience
pub use relay_core::llm::{ChatMessage, ChatModel, ChatRequest, ChatResponse, ChatRole};
