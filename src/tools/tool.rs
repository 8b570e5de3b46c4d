//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface to both
//! agent loops: the text loop hands a tool its raw `Action Input` string,
//! function calling hands it a JSON object.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::llm::ToolDefinition;

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output of the tool
    pub output: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Trait for tools that the agent can use
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Name of the single string argument this tool takes
    fn input_field(&self) -> &str {
        "query"
    }

    /// Get the function definition offered to the model
    fn definition(&self) -> ToolDefinition {
        let field = self.input_field();
        let mut properties = serde_json::Map::new();
        properties.insert(field.to_string(), json!({ "type": "string" }));

        ToolDefinition::function(
            self.name(),
            self.description(),
            json!({
                "type": "object",
                "properties": properties,
                "required": [field]
            }),
        )
    }

    /// Execute the tool with the given input
    ///
    /// Errors returned here are turned into observations by the caller, so
    /// the model gets a chance to recover.
    async fn execute(&self, input: &Value) -> Result<ToolResult>;
}

/// Extract a tool's string argument from either input shape
///
/// Accepts a bare string or an object carrying `field`. Surrounding
/// whitespace is trimmed; quotes only around a bare string.
pub fn text_input(input: &Value, field: &str) -> Result<String> {
    match input {
        Value::String(s) => Ok(s.trim().trim_matches('"').trim().to_string()),
        Value::Object(map) => map
            .get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", field)),
        other => anyhow::bail!("Expected a string or an object, got {}", other),
    }
}
