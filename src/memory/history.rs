//! Chat history storage
//!
//! Messages are stored as JSON documents of the form
//! `{"type": "human", "data": {"content": "..."}}`, one per row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    Human,
    Ai,
}

impl HistoryRole {
    /// Prefix used when rendering history into a prompt
    pub fn label(&self) -> &'static str {
        match self {
            HistoryRole::Human => "Human",
            HistoryRole::Ai => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    pub content: String,
}

/// One stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    #[serde(rename = "type")]
    pub role: HistoryRole,
    pub data: MessageData,
}

impl HistoryMessage {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Human,
            data: MessageData {
                content: content.into(),
            },
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Ai,
            data: MessageData {
                content: content.into(),
            },
        }
    }

    pub fn content(&self) -> &str {
        &self.data.content
    }

    /// Encode for storage
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode history message")
    }

    /// Decode a stored row
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to decode history message")
    }
}

/// Trait for per-session message stores
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    /// All messages for the session, oldest first
    async fn messages(&self) -> Result<Vec<HistoryMessage>>;

    /// Append a message
    async fn add_message(&self, message: HistoryMessage) -> Result<()>;

    /// Remove every message for the session
    async fn clear(&self) -> Result<()>;

    /// Release the underlying connection
    async fn close(&self);
}

/// Process-local history store
#[derive(Default)]
pub struct InMemoryChatHistory {
    messages: Mutex<Vec<HistoryMessage>>,
}

impl InMemoryChatHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatHistoryStore for InMemoryChatHistory {
    async fn messages(&self) -> Result<Vec<HistoryMessage>> {
        Ok(self.messages.lock().await.clone())
    }

    async fn add_message(&self, message: HistoryMessage) -> Result<()> {
        self.messages.lock().await.push(message);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.messages.lock().await.clear();
        Ok(())
    }

    async fn close(&self) {}
}
