//! Deterministic chat model for tests
//!
//! Replays canned responses in order, recording every request it serves.
//! With a script in place, pipeline runs are fully reproducible, which the
//! integration suites rely on for asserting node event sequences.

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::llm::{ChatModel, ChatRequest, ChatResponse};
use relay_core::{GraphError, Result as GraphResult};
use std::collections::VecDeque;
use std::sync::Arc;

/// Chat model that pops scripted responses in order
///
/// When the script runs dry the client answers with a fixed fallback rather
/// than failing, so loosely-scripted tests don't have to count every call.
#[derive(Clone)]
pub struct ScriptedChatModel {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    fallback: Arc<Mutex<Option<String>>>,
    model: String,
}

impl ScriptedChatModel {
    /// Create a model that will return the given responses in order
    pub fn new(responses: Vec<impl Into<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().map(Into::into).collect(),
            )),
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback: Arc::new(Mutex::new(Some("scripted fallback".to_string()))),
            model: "scripted".to_string(),
        }
    }

    /// Create a model with no script; every call returns the fallback
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Replace the fallback; `None` makes script exhaustion an error
    pub fn with_fallback(self, fallback: Option<String>) -> Self {
        *self.fallback.lock() = fallback;
        self
    }

    /// Change the fallback on a shared handle
    pub fn set_fallback(&self, fallback: Option<String>) {
        *self.fallback.lock() = fallback;
    }

    /// Append another response to the script
    pub fn push(&self, response: impl Into<String>) {
        self.responses.lock().push_back(response.into());
    }

    /// Requests served so far, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    /// Number of calls served
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(&self, request: ChatRequest) -> GraphResult<ChatResponse> {
        self.requests.lock().push(request);

        let next = self.responses.lock().pop_front();
        match next {
            Some(content) => Ok(ChatResponse::new(content)),
            None => match self.fallback.lock().clone() {
                Some(content) => Ok(ChatResponse::new(content)),
                None => Err(GraphError::Llm {
                    message: "scripted responses exhausted".to_string(),
                    retryable: false,
                }),
            },
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
