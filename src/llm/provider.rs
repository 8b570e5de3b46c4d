//! LLM Provider trait
//!
//! Abstracts the language-model capability so agents can run against the
//! OpenAI API, any compatible endpoint, or a scripted fake in tests.

use anyhow::Result;

use super::types::{ChatRequest, ChatResponse, DecodingParams, Message};

/// Trait for chat-completion providers used by agent sessions.
///
/// Implementations must apply their `DecodingParams` to every request.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat request, optionally with tools and stop sequences.
    ///
    /// This is the primary method used by both agent loops.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Send a simple message and get a text response (no tool calling).
    ///
    /// Used by the query checker and other one-shot helpers.
    async fn send_message(
        &self,
        user_message: &str,
        conversation_history: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(conversation_history.len() + 2);
        if let Some(system) = system_prompt {
            messages.push(Message::system(system));
        }
        messages.extend_from_slice(conversation_history);
        messages.push(Message::user(user_message));

        let response = self.chat(ChatRequest::new(messages)).await?;
        Ok(response.text())
    }

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// Decoding parameters applied to every request.
    fn decoding(&self) -> &DecodingParams;
}
