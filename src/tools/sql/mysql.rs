//! MySQL-backed [`SqlDatabase`]

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Executor, Row, TypeInfo, ValueRef};

use super::database::{format_table_info, SqlDatabase, SqlRow, SqlValue, SAMPLE_ROWS};
use crate::config::ConnectionUri;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// SQL database over a MySQL connection pool
pub struct MySqlDatabase {
    pool: MySqlPool,
}

impl MySqlDatabase {
    /// Open a pool for the given connection URI
    pub async fn connect(uri: &ConnectionUri) -> Result<Self> {
        tracing::info!("[MySqlDatabase] Connecting to {}", uri);

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(uri.expose())
            .await
            .with_context(|| format!("Failed to connect to database at {}", uri))?;

        Ok(Self { pool })
    }

    async fn columns(&self, table: &str) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to read columns of {}", table))
    }
}

#[async_trait]
impl SqlDatabase for MySqlDatabase {
    fn dialect(&self) -> &str {
        "mysql"
    }

    async fn usable_table_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tables")
    }

    async fn table_info(&self, tables: &[String]) -> Result<String> {
        let available = self.usable_table_names().await?;
        let missing: Vec<&String> = tables.iter().filter(|t| !available.contains(t)).collect();
        if !missing.is_empty() {
            bail!("table_names {:?} not found in database", missing);
        }

        let mut sections = Vec::with_capacity(tables.len());
        for table in tables {
            let ident = quote_ident(table);

            let create = self
                .pool
                .fetch_one(format!("SHOW CREATE TABLE {}", ident).as_str())
                .await
                .with_context(|| format!("Failed to read DDL of {}", table))?;
            let ddl = decode_cell(&create, 1).plain();

            let columns = self.columns(table).await?;
            let sample = self
                .run(&format!("SELECT * FROM {} LIMIT {}", ident, SAMPLE_ROWS))
                .await?;

            sections.push(format_table_info(table, &ddl, &columns, &sample));
        }

        Ok(sections.join("\n\n"))
    }

    async fn run(&self, query: &str) -> Result<Vec<SqlRow>> {
        tracing::debug!("[MySqlDatabase] Running: {}", query);

        let rows = self.pool.fetch_all(query).await?;
        Ok(rows
            .iter()
            .map(|row| (0..row.columns().len()).map(|i| decode_cell(row, i)).collect())
            .collect())
    }

    async fn close(&self) {
        tracing::info!("[MySqlDatabase] Closing connection pool");
        self.pool.close().await;
    }
}

/// Backtick-quote a MySQL identifier
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Decode one cell into the closest [`SqlValue`]
fn decode_cell(row: &MySqlRow, index: usize) -> SqlValue {
    let type_name = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return SqlValue::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return SqlValue::Null,
    };

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return SqlValue::Int(v);
    }
    if let Ok(v) = row.try_get::<u64, _>(index) {
        return SqlValue::UInt(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return SqlValue::Float(v);
    }
    if let Ok(v) = row.try_get::<f32, _>(index) {
        return SqlValue::Float(f64::from(v));
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return SqlValue::Text(v);
    }
    // DECIMAL, DATE and friends come back as text on the wire
    if let Ok(v) = row.try_get_unchecked::<String, _>(index) {
        return SqlValue::Text(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return match String::from_utf8(v) {
            Ok(s) => SqlValue::Text(s),
            Err(e) => SqlValue::Bytes(e.into_bytes()),
        };
    }

    tracing::warn!("[MySqlDatabase] Unsupported column type: {}", type_name);
    SqlValue::Text(format!("<{}>", type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("orders"), "`orders`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }
}
