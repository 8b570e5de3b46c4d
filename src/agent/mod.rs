//! Agents
//!
//! - `factory` - `AgentFactory` and the `CapabilityProvider` seam
//! - `session` - `AgentSession`, the bound model + tools + memory + prompt
//! - `react` - Parser for the SQL agent's text protocol

pub mod factory;
pub mod react;
pub mod session;

pub use factory::{AgentFactory, CapabilityProvider, LiveCapabilities};
pub use react::{AgentStep, ParseError, ReActParser};
pub use session::{AgentSession, Strategy, ITERATION_LIMIT_ANSWER, STOP_SEQUENCES};
