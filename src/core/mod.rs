//! Core types shared across the crate
//!
//! - `ConfigError` - Connection config validation failures
//! - `AgentInitError` - Agent construction failures
//! - `InvocationError` - Failures while answering a query
//! - `SetupError` - Validation or construction, for one-call setup

pub mod error;

pub use error::{AgentInitError, ConfigError, InvocationError, SetupError};
