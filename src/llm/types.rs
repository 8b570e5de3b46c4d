//! Chat completion types
//!
//! These types serialize directly into the OpenAI chat completions wire
//! format, which every provider in this crate speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Decoding
// ============================================================================

/// Sampling parameters sent with every request
///
/// Temperature is pinned to zero so identical prompts give reproducible
/// answers; only the token budget can be changed.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingParams {
    temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl DecodingParams {
    /// Zero-temperature decoding
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 4000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self::deterministic()
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    /// Text content (absent on assistant messages that only call tools)
    #[serde(default)]
    pub content: Option<String>,

    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Id of the call this tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Assistant message carrying tool calls
    pub fn assistant_with_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    /// Result of a tool call
    pub fn tool_result(tool_call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(output.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

/// Function schema offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Always "function"
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

/// Name, description and JSON schema of a callable function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    /// Parse the argument string; blank arguments become an empty object
    pub fn parsed_arguments(&self) -> serde_json::Result<Value> {
        if self.function.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.function.arguments)
    }
}

// ============================================================================
// Request / Response
// ============================================================================

/// A provider-independent chat request
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    /// Sequences that end generation early
    pub stop: Vec<String>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }
}

/// Token usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// The model's reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Plain text reply
    pub fn text_reply(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        }
    }

    /// Reply that only requests tool calls
    pub fn tool_reply(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some("tool_calls".to_string()),
            ..Default::default()
        }
    }

    /// Text content, empty if the model sent none
    pub fn text(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_message_serialization() {
        let msg = Message::tool_result("call_1", "42");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({ "role": "tool", "content": "42", "tool_call_id": "call_1" })
        );
    }

    #[test]
    fn test_assistant_tool_call_parses() {
        let raw = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": { "name": "Python_REPL", "arguments": "{\"query\":\"print(1)\"}" }
            }]
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        let calls = msg.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "Python_REPL");
        assert_eq!(calls[0].parsed_arguments().unwrap()["query"], "print(1)");
    }

    #[test]
    fn test_blank_arguments_become_object() {
        let call = ToolCall {
            id: "c".into(),
            call_type: "function".into(),
            function: FunctionCall {
                name: "sql_db_list_tables".into(),
                arguments: "".into(),
            },
        };
        assert!(call.parsed_arguments().unwrap().is_object());
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let params = DecodingParams::default();
        assert_eq!(params.temperature(), 0.0);
        assert_eq!(params.max_tokens, 4000);
    }
}
