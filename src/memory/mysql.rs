//! MySQL-backed chat history

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use super::history::{ChatHistoryStore, HistoryMessage};
use crate::config::{ConnectionUri, HistoryTable};

/// History rows for one session id in a MySQL table
///
/// The table is created on first use with an auto-increment `id`, the
/// session id column and a `message` column holding the JSON document.
pub struct MySqlChatHistory {
    pool: MySqlPool,
    table: HistoryTable,
    session_id: String,
}

impl MySqlChatHistory {
    /// Connect and make sure the history table exists
    pub async fn connect(uri: &ConnectionUri, table: HistoryTable, session_id: impl Into<String>) -> Result<Self> {
        tracing::info!(
            "[MySqlChatHistory] Connecting to {} (table {})",
            uri,
            table.table_name()
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .connect(uri.expose())
            .await
            .with_context(|| format!("Failed to connect to history store at {}", uri))?;

        let history = Self {
            pool,
            table,
            session_id: session_id.into(),
        };

        if let Err(e) = history.ensure_table().await {
            history.pool.close().await;
            return Err(e);
        }
        Ok(history)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn ensure_table(&self) -> Result<()> {
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS `{}` (id INT AUTO_INCREMENT PRIMARY KEY, `{}` TEXT NOT NULL, message TEXT NOT NULL)",
            self.table.table_name(),
            self.table.session_id_field()
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create history table {}", self.table.table_name()))?;
        Ok(())
    }
}

#[async_trait]
impl ChatHistoryStore for MySqlChatHistory {
    async fn messages(&self) -> Result<Vec<HistoryMessage>> {
        let sql = format!(
            "SELECT message FROM `{}` WHERE `{}` = ? ORDER BY id",
            self.table.table_name(),
            self.table.session_id_field()
        );
        let rows: Vec<String> = sqlx::query_scalar(&sql)
            .bind(&self.session_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to load chat history")?;

        let mut messages = Vec::with_capacity(rows.len());
        for raw in rows {
            match HistoryMessage::from_json(&raw) {
                Ok(message) => messages.push(message),
                Err(e) => tracing::warn!("[MySqlChatHistory] Skipping unreadable row: {:#}", e),
            }
        }
        Ok(messages)
    }

    async fn add_message(&self, message: HistoryMessage) -> Result<()> {
        let sql = format!(
            "INSERT INTO `{}` (`{}`, message) VALUES (?, ?)",
            self.table.table_name(),
            self.table.session_id_field()
        );
        sqlx::query(&sql)
            .bind(&self.session_id)
            .bind(message.to_json()?)
            .execute(&self.pool)
            .await
            .context("Failed to append chat history")?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let sql = format!(
            "DELETE FROM `{}` WHERE `{}` = ?",
            self.table.table_name(),
            self.table.session_id_field()
        );
        sqlx::query(&sql)
            .bind(&self.session_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear chat history")?;
        Ok(())
    }

    async fn close(&self) {
        tracing::info!("[MySqlChatHistory] Closing connection pool");
        self.pool.close().await;
    }
}
