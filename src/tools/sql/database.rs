//! Data-access capability used by the SQL toolkit

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

/// Rows of sample data shown per table in schema descriptions
pub const SAMPLE_ROWS: usize = 3;

/// A single cell of a result set
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("None"),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::UInt(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{:?}", v),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            SqlValue::Bytes(b) => write!(f, "b'{}'", b.escape_ascii()),
        }
    }
}

impl SqlValue {
    /// Unquoted text, as shown in sample rows
    pub fn plain(&self) -> String {
        match self {
            SqlValue::Text(s) => s.clone(),
            SqlValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_string(),
        }
    }
}

/// One result row
pub type SqlRow = Vec<SqlValue>;

/// Render rows as a list of tuples: `[('a', 1), ('b',)]`
pub fn render_rows(rows: &[SqlRow]) -> String {
    let tuples: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            if cells.len() == 1 {
                format!("({},)", cells[0])
            } else {
                format!("({})", cells.join(", "))
            }
        })
        .collect();
    format!("[{}]", tuples.join(", "))
}

/// Render one table's schema section: DDL followed by sample rows
pub fn format_table_info(table: &str, ddl: &str, columns: &[String], sample: &[SqlRow]) -> String {
    let mut out = String::new();
    out.push_str(ddl.trim_end());
    out.push_str("\n\n/*\n");
    out.push_str(&format!("{} rows from {} table:\n", SAMPLE_ROWS, table));
    out.push_str(&columns.join("\t"));
    for row in sample {
        out.push('\n');
        let cells: Vec<String> = row.iter().map(|v| truncate_cell(&v.plain())).collect();
        out.push_str(&cells.join("\t"));
    }
    out.push_str("\n*/");
    out
}

fn truncate_cell(cell: &str) -> String {
    const MAX: usize = 100;
    if cell.chars().count() > MAX {
        format!("{}...", cell.chars().take(MAX).collect::<String>())
    } else {
        cell.to_string()
    }
}

/// Trait for databases the SQL toolkit can query
///
/// Implementations hold an open connection (or pool) which `close` must
/// release.
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// SQL dialect name shown to the model (e.g. "mysql")
    fn dialect(&self) -> &str;

    /// Tables the agent may query, sorted
    async fn usable_table_names(&self) -> Result<Vec<String>>;

    /// DDL and sample rows for each named table
    ///
    /// Fails if any table does not exist.
    async fn table_info(&self, tables: &[String]) -> Result<String>;

    /// Run a statement and return every row
    async fn run(&self, query: &str) -> Result<Vec<SqlRow>>;

    /// Release the underlying connections
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rows() {
        let rows = vec![
            vec![SqlValue::Text("alice".into()), SqlValue::Int(3)],
            vec![SqlValue::Text("o'brien".into()), SqlValue::Null],
        ];
        assert_eq!(render_rows(&rows), r"[('alice', 3), ('o\'brien', None)]");
    }

    #[test]
    fn test_render_single_column_and_floats() {
        let rows = vec![vec![SqlValue::Float(2.0)], vec![SqlValue::UInt(7)]];
        assert_eq!(render_rows(&rows), "[(2.0,), (7,)]");
        assert_eq!(render_rows(&[]), "[]");
    }

    #[test]
    fn test_format_table_info() {
        let info = format_table_info(
            "users",
            "CREATE TABLE `users` (\n  `id` int\n)",
            &["id".to_string(), "name".to_string()],
            &[vec![SqlValue::Int(1), SqlValue::Text("ann".into())]],
        );
        assert!(info.starts_with("CREATE TABLE `users`"));
        assert!(info.contains("3 rows from users table:\nid\tname\n1\tann\n*/"));
    }
}
