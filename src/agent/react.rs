//! Parser for Thought / Action / Action Input / Final Answer output

use anyhow::Result;
use regex::Regex;
use thiserror::Error;

/// Marker that ends the reasoning loop
pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

/// Observation used when a parse failure is not reported back verbatim
pub const INVALID_RESPONSE: &str = "Invalid or incomplete response";

/// One parsed model step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// Run `tool` with `input`
    Action { tool: String, input: String },
    /// Stop with `output`
    Finish { output: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Parsing LLM output produced both a final answer and a parse-able action: {0}")]
    AnswerAndAction(String),

    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Could not parse LLM output: `{0}`")]
    Unparseable(String),
}

impl ParseError {
    /// Text fed back to the model as the observation for this step
    pub fn observation(&self) -> String {
        match self {
            ParseError::MissingAction | ParseError::MissingActionInput => self.to_string(),
            ParseError::AnswerAndAction(_) | ParseError::Unparseable(_) => INVALID_RESPONSE.to_string(),
        }
    }
}

/// Single-input ReAct output parser
pub struct ReActParser {
    action: Regex,
    action_only: Regex,
    action_input_only: Regex,
}

impl ReActParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            action: Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")?,
            action_only: Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)")?,
            action_input_only: Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")?,
        })
    }

    pub fn parse(&self, text: &str) -> Result<AgentStep, ParseError> {
        let includes_answer = text.contains(FINAL_ANSWER_ACTION);

        if let Some(caps) = self.action.captures(text) {
            if includes_answer {
                return Err(ParseError::AnswerAndAction(text.to_string()));
            }
            let tool = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            return Ok(AgentStep::Action {
                tool: tool.to_string(),
                input: input.trim_matches(' ').trim_matches('"').to_string(),
            });
        }

        if includes_answer {
            let output = text.rsplit(FINAL_ANSWER_ACTION).next().unwrap_or_default();
            return Ok(AgentStep::Finish {
                output: output.trim().to_string(),
            });
        }

        if !self.action_only.is_match(text) {
            Err(ParseError::MissingAction)
        } else if !self.action_input_only.is_match(text) {
            Err(ParseError::MissingActionInput)
        } else {
            Err(ParseError::Unparseable(text.to_string()))
        }
    }
}
