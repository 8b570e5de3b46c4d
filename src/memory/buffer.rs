//! Windowed conversation buffer over a history store

use std::sync::Arc;

use anyhow::Result;

use super::history::{ChatHistoryStore, HistoryMessage};

/// Conversation memory for one session
///
/// Renders the most recent turns for the `chat_history` prompt slot and
/// records each finished exchange.
pub struct ConversationMemory {
    store: Arc<dyn ChatHistoryStore>,
    window: usize,
}

impl ConversationMemory {
    /// `window` is the number of turns (human + AI pairs) fed back
    pub fn new(store: Arc<dyn ChatHistoryStore>, window: usize) -> Self {
        Self { store, window }
    }

    /// Recent history as `Human: ...` / `AI: ...` lines
    pub async fn load_history(&self) -> Result<String> {
        let messages = self.store.messages().await?;
        let keep = self.window.saturating_mul(2);
        let start = messages.len().saturating_sub(keep);

        Ok(messages[start..]
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content()))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Record one exchange
    pub async fn save_context(&self, input: &str, output: &str) -> Result<()> {
        self.store.add_message(HistoryMessage::human(input)).await?;
        self.store.add_message(HistoryMessage::ai(output)).await?;
        tracing::debug!("[ConversationMemory] Saved turn ({} + {} chars)", input.len(), output.len());
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    pub fn store(&self) -> &Arc<dyn ChatHistoryStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryChatHistory;

    #[tokio::test]
    async fn test_empty_history_renders_empty() {
        let memory = ConversationMemory::new(Arc::new(InMemoryChatHistory::new()), 20);
        assert_eq!(memory.load_history().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let memory = ConversationMemory::new(Arc::new(InMemoryChatHistory::new()), 20);
        memory.save_context("How many users?", "[(42,)]").await.unwrap();

        assert_eq!(
            memory.load_history().await.unwrap(),
            "Human: How many users?\nAI: [(42,)]"
        );
    }

    #[tokio::test]
    async fn test_window_keeps_latest_turns() {
        let memory = ConversationMemory::new(Arc::new(InMemoryChatHistory::new()), 2);
        for i in 0..5 {
            memory
                .save_context(&format!("q{}", i), &format!("a{}", i))
                .await
                .unwrap();
        }

        assert_eq!(
            memory.load_history().await.unwrap(),
            "Human: q3\nAI: a3\nHuman: q4\nAI: a4"
        );
    }

    #[tokio::test]
    async fn test_clear() {
        let memory = ConversationMemory::new(Arc::new(InMemoryChatHistory::new()), 20);
        memory.save_context("q", "a").await.unwrap();
        memory.clear().await.unwrap();
        assert!(memory.store().messages().await.unwrap().is_empty());
    }
}
