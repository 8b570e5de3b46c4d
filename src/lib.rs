pub mod core;
pub mod config;
pub mod llm;
pub mod tools;
pub mod memory;
pub mod prompt;

// Agent factory and sessions
pub mod agent;

// Optional components
pub mod cli;
pub mod logging;

#[cfg(test)]
mod testing;

pub use agent::{AgentFactory, AgentSession, CapabilityProvider, LiveCapabilities};
pub use config::{validate, AgentSettings, ConnectionConfig, ConnectionUri, Secrets, ValidatedConfig};
pub use core::{AgentInitError, ConfigError, InvocationError, SetupError};
