//! Error types
//!
//! Configuration problems are reported before any capability is touched,
//! capability construction problems are collapsed into a single
//! `AgentInitError`, and invocation problems pass through from the model or
//! tool that raised them.

use thiserror::Error;

use crate::prompt::PromptError;

/// Errors raised while validating raw connection parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The input was absent or was not a key/value mapping
    #[error("Invalid database configuration: expected a mapping of connection fields")]
    NotAMapping,

    /// A required field was missing, empty, or not a string
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Failure while assembling an agent session
///
/// Carries only the causal message; callers never learn which internal step
/// failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to initialize agent: {cause}")]
pub struct AgentInitError {
    /// Rendered cause, including its context chain
    pub cause: String,
}

impl AgentInitError {
    /// Create an init error from a message
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}

impl From<anyhow::Error> for AgentInitError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{:#}", err))
    }
}

/// Errors raised while an agent session answers a query
#[derive(Error, Debug)]
pub enum InvocationError {
    /// Error from the model or a tool capability, passed through unmodified
    #[error(transparent)]
    Capability(#[from] anyhow::Error),

    /// The prompt could not be rendered
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Either half of agent setup: validation or construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Init(#[from] AgentInitError),
}
