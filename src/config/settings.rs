//! Agent settings
//!
//! Everything that shapes a session apart from the connection and the
//! secrets: model, decoding, history table, executor limits and the code
//! tool's interpreter.
//!
//! ```ignore
//! let settings = AgentSettings::from_env()?
//!     .with_session_id("analyst-42")
//!     .with_top_k(25)
//!     .with_max_iterations(10);
//! ```

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm::DecodingParams;

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default chat completions endpoint
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/chat/completions";

/// Default session identifier for conversation history
pub const DEFAULT_SESSION_ID: &str = "my-session";

/// Name and key column of the table that stores past turns
#[derive(Clone, PartialEq, Eq)]
pub struct HistoryTable {
    table_name: String,
    session_id_field: String,
}

impl HistoryTable {
    /// Create a history table description
    ///
    /// Both names are interpolated into SQL, so they must be plain
    /// identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
    pub fn new(table_name: impl Into<String>, session_id_field: impl Into<String>) -> Result<Self> {
        let table_name = table_name.into();
        let session_id_field = session_id_field.into();

        check_identifier(&table_name).context("Invalid history table name")?;
        check_identifier(&session_id_field).context("Invalid session id field name")?;

        Ok(Self {
            table_name,
            session_id_field,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn session_id_field(&self) -> &str {
        &self.session_id_field
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self {
            table_name: "message_store".to_string(),
            session_id_field: "session_id".to_string(),
        }
    }
}

impl fmt::Debug for HistoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.table_name, self.session_id_field)
    }
}

fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        anyhow::bail!("'{}' is not a plain SQL identifier", name);
    }
    Ok(())
}

/// Settings shared by every session the factory creates
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Chat model used by the SQL agent
    pub model: String,

    /// Chat completions endpoint
    pub api_base: String,

    /// Decoding parameters (temperature is always zero)
    pub decoding: DecodingParams,

    /// Session identifier for conversation history
    pub session_id: String,

    /// Table holding conversation history
    pub history_table: HistoryTable,

    /// Number of past turns replayed into the prompt
    pub history_window: usize,

    /// Extra grounding rules for the SQL agent, one per line
    pub domain_hints: String,

    /// Default row limit the SQL agent is told to respect
    pub top_k: usize,

    /// Maximum reasoning steps per invocation
    pub max_iterations: usize,

    /// Interpreter for the Python tool
    pub python_bin: String,

    /// Wall-clock limit for a single Python run
    pub python_timeout: Duration,
}

impl AgentSettings {
    /// Settings with all defaults
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            decoding: DecodingParams::deterministic(),
            session_id: DEFAULT_SESSION_ID.to_string(),
            history_table: HistoryTable::default(),
            history_window: 20,
            domain_hints: String::new(),
            top_k: 10,
            max_iterations: 15,
            python_bin: "python3".to_string(),
            python_timeout: Duration::from_secs(30),
        }
    }

    /// Defaults overridden by `LLM_MODEL_NAME`, `OPENAI_API_BASE`,
    /// `AGENT_SESSION_ID`, `LLM_MAX_TOKENS`, `AGENT_DOMAIN_HINTS` and `PYTHON_BIN`
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::new();

        if let Ok(model) = env::var("LLM_MODEL_NAME") {
            settings.model = model;
        }
        if let Ok(api_base) = env::var("OPENAI_API_BASE") {
            settings.api_base = api_base;
        }
        if let Ok(session_id) = env::var("AGENT_SESSION_ID") {
            settings.session_id = session_id;
        }
        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            settings.decoding.max_tokens = max_tokens
                .parse()
                .with_context(|| format!("LLM_MAX_TOKENS is not a number: {}", max_tokens))?;
        }
        if let Ok(hints) = env::var("AGENT_DOMAIN_HINTS") {
            settings.domain_hints = hints;
        }
        if let Ok(python_bin) = env::var("PYTHON_BIN") {
            settings.python_bin = python_bin;
        }

        tracing::info!("Using model: {}", settings.model);
        tracing::info!("Max tokens: {}", settings.decoding.max_tokens);
        tracing::debug!("History session: {}", settings.session_id);

        Ok(settings)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.decoding.max_tokens = max_tokens;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_history_table(mut self, table: HistoryTable) -> Self {
        self.history_table = table;
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn with_domain_hints(mut self, hints: impl Into<String>) -> Self {
        self.domain_hints = hints.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_python(mut self, python_bin: impl Into<String>, timeout: Duration) -> Self {
        self.python_bin = python_bin.into();
        self.python_timeout = timeout;
        self
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::new()
    }
}
