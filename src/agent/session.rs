//! Agent sessions
//!
//! A session binds a language model, a tool registry, an optional
//! conversation memory and a prompt strategy. Two strategies exist:
//!
//! - `React` - text loop over the SQL scaffold: the model writes
//!   Thought/Action/Action Input, tools answer with Observations, until a
//!   Final Answer appears
//! - `Functions` - native tool calling with fixed system instructions, used
//!   by the code agent

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::react::{AgentStep, ReActParser};
use crate::core::InvocationError;
use crate::llm::{ChatRequest, LlmProvider, Message};
use crate::memory::ConversationMemory;
use crate::prompt::{PromptTemplate, FALLBACK_ANSWER, NO_RESULTS};
use crate::tools::{SqlDatabase, ToolRegistry};

/// Sequences that end a ReAct step before the model invents an observation
pub const STOP_SEQUENCES: [&str; 2] = ["\nObservation:", "\n\tObservation:"];

/// Answer returned when the loop runs out of iterations
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// How a session talks to its model
pub enum Strategy {
    React {
        prompt: PromptTemplate,
        parser: ReActParser,
    },
    Functions {
        system_prompt: String,
    },
}

/// A bound agent, ready to answer questions
///
/// `invoke` takes `&mut self`: one session serves one caller at a time.
pub struct AgentSession {
    id: String,
    created_at: DateTime<Utc>,
    llm: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    strategy: Strategy,
    max_iterations: usize,
    memory: Option<ConversationMemory>,
    database: Option<Arc<dyn SqlDatabase>>,
}

impl fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSession")
            .field("id", &self.id)
            .field("tools", &self.tools.tool_names())
            .field("has_memory", &self.memory.is_some())
            .finish_non_exhaustive()
    }
}

impl AgentSession {
    pub fn new(
        id: impl Into<String>,
        llm: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        strategy: Strategy,
        max_iterations: usize,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            llm,
            tools,
            strategy,
            max_iterations,
            memory: None,
            database: None,
        }
    }

    /// Attach conversation memory; turns are loaded and saved through it
    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Attach the database handle released by `close`
    pub fn with_database(mut self, database: Arc<dyn SqlDatabase>) -> Self {
        self.database = Some(database);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.tool_names()
    }

    pub fn has_memory(&self) -> bool {
        self.memory.is_some()
    }

    /// Answer one input
    pub async fn invoke(&mut self, input: &str) -> Result<String, InvocationError> {
        tracing::info!(
            "[AgentSession] {} invoked with {} chars",
            self.id,
            input.len()
        );

        let output = match &self.strategy {
            Strategy::React { prompt, parser } => self.run_react(prompt, parser, input).await?,
            Strategy::Functions { system_prompt } => self.run_functions(system_prompt, input).await?,
        };

        if let Some(memory) = &self.memory {
            memory.save_context(input, &output).await?;
        }

        tracing::info!("[AgentSession] {} answered with {} chars", self.id, output.len());
        Ok(output)
    }

    /// Forget the conversation so far
    pub async fn clear_memory(&mut self) -> Result<(), InvocationError> {
        if let Some(memory) = &self.memory {
            memory.clear().await?;
            tracing::info!("[AgentSession] {} memory cleared", self.id);
        }
        Ok(())
    }

    /// Release history and database handles, in that order
    pub async fn close(self) {
        tracing::info!("[AgentSession] Closing {}", self.id);
        if let Some(memory) = &self.memory {
            memory.store().close().await;
        }
        if let Some(database) = &self.database {
            database.close().await;
        }
    }

    async fn run_react(
        &self,
        prompt: &PromptTemplate,
        parser: &ReActParser,
        input: &str,
    ) -> Result<String, InvocationError> {
        let chat_history = match &self.memory {
            Some(memory) => memory.load_history().await?,
            None => String::new(),
        };
        let mut scratchpad = String::new();

        for iteration in 1..=self.max_iterations {
            let rendered = prompt.format(&[
                ("chat_history", chat_history.as_str()),
                ("input", input),
                ("agent_scratchpad", scratchpad.as_str()),
            ])?;

            tracing::debug!(
                "[SqlAgent] Step {} with {} prompt chars",
                iteration,
                rendered.len()
            );

            let request = ChatRequest::new(vec![Message::user(rendered)]).with_stop(STOP_SEQUENCES);
            let text = self.llm.chat(request).await?.text();

            let observation = match parser.parse(&text) {
                Ok(AgentStep::Finish { output }) => {
                    tracing::info!("[SqlAgent] Finished after {} steps", iteration);
                    return Ok(normalize_answer(&output));
                }
                Ok(AgentStep::Action { tool, input }) => {
                    tracing::info!("[SqlAgent] Action: {}", tool);
                    self.observe(&tool, &Value::String(input)).await
                }
                Err(e) => {
                    tracing::warn!("[SqlAgent] Unparseable step: {}", e);
                    e.observation()
                }
            };

            scratchpad.push_str(&text);
            scratchpad.push_str("\nObservation: ");
            scratchpad.push_str(&observation);
            scratchpad.push_str("\nThought: ");
        }

        tracing::warn!("[SqlAgent] Max iterations ({}) reached", self.max_iterations);
        Ok(ITERATION_LIMIT_ANSWER.to_string())
    }

    async fn run_functions(&self, system_prompt: &str, input: &str) -> Result<String, InvocationError> {
        let definitions = self.tools.definitions();
        let mut messages = vec![Message::system(system_prompt), Message::user(input)];

        for iteration in 1..=self.max_iterations {
            tracing::info!(
                "[CodeAgent] Calling LLM with {} messages (iteration {})",
                messages.len(),
                iteration
            );

            let request = ChatRequest::new(messages.clone()).with_tools(definitions.clone());
            let response = self.llm.chat(request).await?;

            if !response.has_tool_calls() {
                let answer = response.text();
                return Ok(if answer.trim().is_empty() {
                    FALLBACK_ANSWER.to_string()
                } else {
                    answer
                });
            }

            messages.push(Message::assistant_with_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                tracing::info!("[CodeAgent] Tool use: {} ({})", call.function.name, call.id);
                // Non-JSON arguments are taken as the tool's single string input
                let args = call
                    .parsed_arguments()
                    .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
                let output = self.observe(&call.function.name, &args).await;
                messages.push(Message::tool_result(&call.id, output));
            }
        }

        tracing::warn!("[CodeAgent] Max iterations ({}) reached", self.max_iterations);
        Ok(ITERATION_LIMIT_ANSWER.to_string())
    }

    /// Run a tool and turn every outcome into observation text
    async fn observe(&self, tool: &str, input: &Value) -> String {
        if self.tools.get(tool).is_none() {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                tool,
                self.tools.tool_names().join(", ")
            );
        }

        match self.tools.execute(tool, input).await {
            Ok(result) => result.output,
            Err(e) => {
                tracing::warn!("[AgentSession] Tool {} failed: {:#}", tool, e);
                format!("Error: {:#}", e)
            }
        }
    }
}

/// Blank answers become the literal empty-result answer
fn normalize_answer(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        NO_RESULTS.to_string()
    } else {
        trimmed.to_string()
    }
}
