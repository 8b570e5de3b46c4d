//! Conversation memory
//!
//! - `history` - `ChatHistoryStore` trait, stored message shape, in-memory store
//! - `mysql` - MySQL-backed store
//! - `buffer` - `ConversationMemory`, the windowed view used by agents

pub mod buffer;
pub mod history;
pub mod mysql;

pub use buffer::ConversationMemory;
pub use history::{ChatHistoryStore, HistoryMessage, HistoryRole, InMemoryChatHistory, MessageData};
pub use mysql::MySqlChatHistory;
