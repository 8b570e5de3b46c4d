//! OpenAI chat completions client
//!
//! Direct HTTP client for the OpenAI chat completions API and any endpoint
//! that speaks the same format.
//!
//! ```ignore
//! let llm = OpenAiProvider::new(secrets.openai_api_key())
//!     .with_model("gpt-4o-mini")
//!     .with_max_tokens(4000);
//! ```

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider::LlmProvider;
use super::types::{
    ChatRequest, ChatResponse, DecodingParams, Message, ToolCall, ToolDefinition, Usage,
};
use crate::config::{DEFAULT_API_BASE, DEFAULT_MODEL};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    #[serde(skip_serializing_if = "is_empty")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "is_empty")]
    stop: &'a [String],
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

// ============================================================================
// Provider
// ============================================================================

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    decoding: DecodingParams,
}

impl OpenAiProvider {
    /// Create a provider for the OpenAI API with the default model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            decoding: DecodingParams::deterministic(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.decoding.max_tokens = max_tokens;
        self
    }

    /// Replace the decoding parameters
    pub fn with_decoding(mut self, decoding: DecodingParams) -> Self {
        self.decoding = decoding;
        self
    }

    /// Point at a different chat completions endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn send_request(&self, request: &CompletionRequest<'_>) -> Result<CompletionResponse> {
        let request_json =
            serde_json::to_string(request).context("Failed to serialize chat request")?;
        tracing::debug!("[OpenAI] Request size: {} bytes", request_json.len());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .body(request_json)
            .send()
            .await
            .context("Failed to send request to chat completions API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read chat completions response body")?;

        tracing::debug!("[OpenAI] Response status: {}", status);

        if !status.is_success() {
            tracing::error!("[OpenAI] API error: {} - {}", status, response_text);
            anyhow::bail!("OpenAI API error ({}): {}", status, response_text);
        }

        serde_json::from_str(&response_text).context("Failed to parse chat completions response")
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        tracing::info!("[OpenAI] Sending chat request");
        tracing::debug!("[OpenAI] Messages count: {}", request.messages.len());
        tracing::debug!("[OpenAI] Tools count: {}", request.tools.len());

        let body = CompletionRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: self.decoding.temperature(),
            max_tokens: self.decoding.max_tokens,
            top_p: self.decoding.top_p,
            frequency_penalty: self.decoding.frequency_penalty,
            presence_penalty: self.decoding.presence_penalty,
            tools: &request.tools,
            stop: &request.stop,
        };

        let response = self.send_request(&body).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("Chat completions response contained no choices")?;

        Ok(ChatResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
            finish_reason: choice.finish_reason,
            usage: response.usage,
        })
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn decoding(&self) -> &DecodingParams {
        &self.decoding
    }
}
