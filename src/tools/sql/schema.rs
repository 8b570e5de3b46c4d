//! sql_db_schema and sql_db_list_tables

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::database::SqlDatabase;
use crate::tools::tool::{text_input, Tool, ToolResult};

/// Tool that describes tables: DDL plus sample rows
pub struct InfoSqlTool {
    db: Arc<dyn SqlDatabase>,
}

impl InfoSqlTool {
    pub fn new(db: Arc<dyn SqlDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for InfoSqlTool {
    fn name(&self) -> &str {
        "sql_db_schema"
    }

    fn description(&self) -> &str {
        "Input to this tool is a comma-separated list of tables, output is the schema and sample rows for those tables. \
         Be sure that the tables actually exist by calling sql_db_list_tables first! \
         Example Input: table1, table2, table3"
    }

    fn input_field(&self) -> &str {
        "table_names"
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let raw = text_input(input, self.input_field())?;
        let tables: Vec<String> = raw
            .split(',')
            .map(|t| t.trim().trim_matches('`').to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if tables.is_empty() {
            return Ok(ToolResult::error("Error: no table names given"));
        }

        match self.db.table_info(&tables).await {
            Ok(info) => Ok(ToolResult::success(info)),
            Err(e) => Ok(ToolResult::error(format!("Error: {:#}", e))),
        }
    }
}

/// Tool that lists the tables the agent may query
pub struct ListSqlDatabaseTool {
    db: Arc<dyn SqlDatabase>,
}

impl ListSqlDatabaseTool {
    pub fn new(db: Arc<dyn SqlDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for ListSqlDatabaseTool {
    fn name(&self) -> &str {
        "sql_db_list_tables"
    }

    fn description(&self) -> &str {
        "Input is an empty string, output is a comma-separated list of tables in the database."
    }

    fn input_field(&self) -> &str {
        "tool_input"
    }

    async fn execute(&self, _input: &Value) -> Result<ToolResult> {
        match self.db.usable_table_names().await {
            Ok(tables) => Ok(ToolResult::success(tables.join(", "))),
            Err(e) => Ok(ToolResult::error(format!("Error: {:#}", e))),
        }
    }
}
