//! SQL toolkit
//!
//! Four tools over one [`SqlDatabase`]: list tables, describe tables,
//! check a query with the model, run a query.

pub mod checker;
pub mod database;
pub mod mysql;
pub mod query;
pub mod schema;

use std::sync::Arc;

use anyhow::Result;

pub use checker::QueryCheckerTool;
pub use database::{render_rows, SqlDatabase, SqlRow, SqlValue};
pub use mysql::MySqlDatabase;
pub use query::QuerySqlTool;
pub use schema::{InfoSqlTool, ListSqlDatabaseTool};

use super::registry::ToolRegistry;
use crate::llm::LlmProvider;

/// Register the SQL toolkit for `db` into `registry`
pub fn register_sql_toolkit(
    registry: &mut ToolRegistry,
    db: Arc<dyn SqlDatabase>,
    llm: Arc<dyn LlmProvider>,
) -> Result<()> {
    let dialect = db.dialect().to_string();
    registry.register(QuerySqlTool::new(db.clone()));
    registry.register(InfoSqlTool::new(db.clone()));
    registry.register(ListSqlDatabaseTool::new(db));
    registry.register(QueryCheckerTool::new(llm, &dialect)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDatabase, ScriptedLlm};

    #[test]
    fn test_toolkit_names() {
        let mut registry = ToolRegistry::new();
        register_sql_toolkit(
            &mut registry,
            Arc::new(FakeDatabase::new()),
            Arc::new(ScriptedLlm::new(Vec::<String>::new())),
        )
        .unwrap();

        assert_eq!(
            registry.tool_names(),
            vec![
                "sql_db_list_tables",
                "sql_db_query",
                "sql_db_query_checker",
                "sql_db_schema"
            ]
        );
    }
}
