//! Tool system for the agents
//!
//! This module provides:
//! - `Tool` trait - Interface for implementing tools
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - Registry for managing available tools
//! - `sql` - The SQL toolkit over a `SqlDatabase`
//! - `python` - The sandboxed Python tool used by the code agent

mod registry;
mod tool;

pub mod python;
pub mod sql;

// Core exports
pub use registry::ToolRegistry;
pub use tool::{text_input, Tool, ToolResult};

pub use python::PythonReplTool;
pub use sql::{
    register_sql_toolkit, InfoSqlTool, ListSqlDatabaseTool, MySqlDatabase, QueryCheckerTool,
    QuerySqlTool, SqlDatabase, SqlRow, SqlValue,
};
