//! Configuration
//!
//! - `connection` - Database connection fields and their validation
//! - `uri` - Connection URI rendering
//! - `secrets` - API credentials
//! - `settings` - Model, history and executor settings

pub mod connection;
pub mod secrets;
pub mod settings;
pub mod uri;

pub use connection::{validate, ConnectionConfig, ValidatedConfig, REQUIRED_FIELDS};
pub use secrets::Secrets;
pub use settings::{AgentSettings, HistoryTable, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use uri::{ConnectionUri, DRIVER_SCHEME};
