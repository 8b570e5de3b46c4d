//! Credentials for external capabilities
//!
//! Loaded once at startup and passed explicitly into the agent factory.

use std::env;
use std::fmt;

use anyhow::{Context, Result};

/// API credentials injected into the agent factory
#[derive(Clone)]
pub struct Secrets {
    openai_api_key: String,
}

impl Secrets {
    /// Create secrets with an explicit API key
    pub fn new(openai_api_key: impl Into<String>) -> Self {
        Self {
            openai_api_key: openai_api_key.into(),
        }
    }

    /// Read `OPENAI_API_KEY` from the environment
    pub fn from_env() -> Result<Self> {
        let key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY environment variable not set")?;

        if key.trim().is_empty() {
            anyhow::bail!("OPENAI_API_KEY environment variable is empty");
        }

        tracing::info!("Loaded API credentials from environment");
        Ok(Self::new(key))
    }

    /// The language-model API key
    pub fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"***")
            .finish()
    }
}
