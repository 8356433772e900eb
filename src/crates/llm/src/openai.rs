//! OpenAI-compatible chat completions client

use crate::config::RemoteLlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use relay_core::llm::{ChatMessage, ChatModel, ChatRequest, ChatResponse, ChatRole};
use relay_core::Result as GraphResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat completions client for OpenAI and API-compatible gateways
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a client with the given configuration
    pub fn new(config: RemoteLlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Http)?;
        Ok(Self { config, client })
    }

    fn convert_message(message: &ChatMessage) -> WireMessage {
        WireMessage {
            role: match message.role {
                ChatRole::System => "system",
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            }
            .to_string(),
            content: message.content.clone(),
        }
    }

    async fn chat_inner(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());

        let body = WireRequest {
            model: model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            temperature: request.temperature.or(self.config.temperature),
            max_tokens: request.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e.to_string())
                } else {
                    LlmError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Authentication(text),
                429 => LlmError::RateLimited(text),
                _ => LlmError::Provider(format!("API error {}: {}", status, text)),
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response carried no choices".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content,
            model: Some(wire.model),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> GraphResult<ChatResponse> {
        Ok(self.chat_inner(request).await?)
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Wire types for the chat completions API

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}
