//! Language model client boundary
//!
//! The pipeline is an orchestrator, not an LLM client library: this module
//! defines the minimal trait nodes call through, and provider implementations
//! live in the `llm` crate. A fresh client handle is injected per run; there
//! are no process-global model singletons.

use crate::error::Result;
use crate::messages::{Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a chat prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions framing the exchange
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
}

/// One message of a chat prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// Convert a conversation history entry into a prompt message
    pub fn from_history(message: &Message) -> Self {
        match message.role {
            Role::User => Self::user(message.content.clone()),
            Role::Assistant => Self::assistant(message.content.clone()),
        }
    }
}

/// A complete chat request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered prompt messages
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Completion length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    /// Per-request model override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatRequest {
    /// Create a request from prompt messages
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Prepend a system message
    pub fn with_system(mut self, content: impl Into<String>) -> Self {
        self.messages.insert(0, ChatMessage::system(content));
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion length cap
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Override the model for this request
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// A complete chat response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response text
    pub content: String,
    /// Model that produced the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatResponse {
    /// Create a response with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
        }
    }
}

/// Chat-based language model client
///
/// Implementations must be `Send + Sync`; nodes hold them as
/// `Arc<dyn ChatModel>`. Provider errors are surfaced as
/// [`GraphError::Llm`](crate::error::GraphError::Llm) with a retryability
/// classification so the runtime can apply its per-node retry policy.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete response for the request
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Whether the provider is reachable and configured
    async fn is_available(&self) -> bool {
        true
    }

    /// Default model name for this client
    fn model_name(&self) -> &str;
}
