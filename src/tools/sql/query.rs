//! sql_db_query: run a read-only statement

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::database::{render_rows, SqlDatabase};
use crate::prompt::NO_RESULTS;
use crate::tools::tool::{text_input, Tool, ToolResult};

/// Statement keywords the query tool will run
const READ_ONLY_KEYWORDS: [&str; 8] = [
    "SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "WITH", "VALUES", "TABLE",
];

/// Tool that executes a SQL query and returns the rows
pub struct QuerySqlTool {
    db: Arc<dyn SqlDatabase>,
}

impl QuerySqlTool {
    pub fn new(db: Arc<dyn SqlDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for QuerySqlTool {
    fn name(&self) -> &str {
        "sql_db_query"
    }

    fn description(&self) -> &str {
        "Input to this tool is a detailed and correct SQL query, output is a result from the database. \
         If the query is not correct, an error message will be returned. \
         If an error is returned, rewrite the query, check the query, and try again. \
         If you encounter an issue with Unknown column 'xxxx' in 'field list', use sql_db_schema to query the correct table fields."
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let query = text_input(input, self.input_field())?;
        if query.is_empty() {
            return Ok(ToolResult::error("Error: empty query"));
        }

        if let Some(keyword) = first_write_keyword(&query) {
            tracing::warn!("[QuerySqlTool] Refused non read-only statement: {}", keyword);
            return Ok(ToolResult::error(format!(
                "Error: {} statements are not allowed. Only read-only queries ({}) may be run.",
                keyword,
                READ_ONLY_KEYWORDS.join(", ")
            )));
        }

        match self.db.run(&query).await {
            Ok(rows) if rows.is_empty() => Ok(ToolResult::success(NO_RESULTS)),
            Ok(rows) => {
                tracing::debug!("[QuerySqlTool] {} rows returned", rows.len());
                Ok(ToolResult::success(render_rows(&rows)))
            }
            Err(e) => Ok(ToolResult::error(format!("Error: {:#}", e))),
        }
    }
}

/// First keyword of any statement in `query` that is not read-only
///
/// Each `;`-separated statement is checked after stripping leading
/// comments and parentheses.
pub fn first_write_keyword(query: &str) -> Option<String> {
    split_statements(query)
        .into_iter()
        .map(leading_keyword)
        .filter(|k| !k.is_empty())
        .find(|k| !READ_ONLY_KEYWORDS.contains(&k.as_str()))
}

/// Split on `;` outside quoted text and comments
fn split_statements(query: &str) -> Vec<&str> {
    let bytes = query.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    // backslash escapes do not apply inside identifiers
                    if bytes[i] == b'\\' && quote != b'`' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_line(bytes, i);
            }
            b'#' => {
                i = skip_line(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = query[i + 2..]
                    .find("*/")
                    .map(|end| i + 2 + end + 1)
                    .unwrap_or(bytes.len());
            }
            b';' => {
                statements.push(&query[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    statements.push(&query[start..]);
    statements
}

fn skip_line(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| from + offset)
        .unwrap_or(bytes.len())
}

fn leading_keyword(statement: &str) -> String {
    let mut rest = statement;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("--").or_else(|| rest.strip_prefix('#')) {
            rest = after.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
        } else {
            break;
        }
    }

    rest.chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDatabase;
    use crate::tools::sql::database::SqlValue;
    use serde_json::json;

    #[test]
    fn test_read_only_guard() {
        assert_eq!(first_write_keyword("SELECT * FROM users"), None);
        assert_eq!(first_write_keyword("  with t as (select 1) select * from t"), None);
        assert_eq!(first_write_keyword("(SELECT 1) UNION (SELECT 2);"), None);
        assert_eq!(first_write_keyword("-- note\nSHOW TABLES"), None);
        assert_eq!(
            first_write_keyword("DROP TABLE users"),
            Some("DROP".to_string())
        );
        assert_eq!(
            first_write_keyword("SELECT 1; delete from users"),
            Some("DELETE".to_string())
        );
        assert_eq!(
            first_write_keyword("/* hi */ UPDATE users SET a = 1"),
            Some("UPDATE".to_string())
        );
    }

    #[test]
    fn test_semicolons_inside_literals_and_comments() {
        assert_eq!(
            first_write_keyword("SELECT id FROM orders WHERE LOWER(note) LIKE '%a;drop%'"),
            None
        );
        assert_eq!(first_write_keyword("SELECT \"x;delete\", `a;update` FROM t"), None);
        assert_eq!(first_write_keyword("SELECT 'it\\'s; drop' FROM t"), None);
        assert_eq!(first_write_keyword("SELECT 1 -- trailing; drop\nFROM t"), None);
        assert_eq!(first_write_keyword("SELECT /* a; drop */ 1"), None);
        assert_eq!(
            first_write_keyword("SELECT ';' FROM t; DROP TABLE t"),
            Some("DROP".to_string())
        );
    }

    #[tokio::test]
    async fn test_rows_are_rendered() {
        let db = FakeDatabase::new().with_result(
            "SELECT name, total FROM orders",
            vec![vec![SqlValue::Text("ann".into()), SqlValue::Int(3)]],
        );
        let tool = QuerySqlTool::new(Arc::new(db));

        let result = tool
            .execute(&json!("SELECT name, total FROM orders"))
            .await
            .unwrap();
        assert_eq!(result.output, "[('ann', 3)]");
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_empty_result_is_no_results_found() {
        let db = FakeDatabase::new().with_result("SELECT 1 FROM t WHERE 0", vec![]);
        let tool = QuerySqlTool::new(Arc::new(db));

        let result = tool
            .execute(&json!({ "query": "SELECT 1 FROM t WHERE 0" }))
            .await
            .unwrap();
        assert_eq!(result.output, "No results found");
    }

    #[tokio::test]
    async fn test_database_errors_become_observations() {
        let tool = QuerySqlTool::new(Arc::new(FakeDatabase::new()));

        let result = tool.execute(&json!("SELECT nope FROM t")).await.unwrap();
        assert!(result.is_error);
        assert!(result.output.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_writes_never_reach_the_database() {
        let db = Arc::new(FakeDatabase::new());
        let tool = QuerySqlTool::new(db.clone());

        let result = tool.execute(&json!("DELETE FROM users")).await.unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("DELETE statements are not allowed"));
        assert!(db.executed().is_empty());
    }
}
