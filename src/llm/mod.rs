pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use types::{
    ChatRequest, ChatResponse, DecodingParams, FunctionCall, FunctionDefinition, Message, Role,
    ToolCall, ToolDefinition, Usage,
};
