//! Prompt scaffolds
//!
//! - `template` - Templates with named slots
//! - `sql` - SQL agent scaffold with grounding rules
//! - `code` - Code agent instructions

pub mod code;
pub mod sql;
pub mod template;

pub use code::{extract_code_block, CODE_AGENT_INSTRUCTIONS, FALLBACK_ANSWER};
pub use sql::{sql_agent_prompt, NO_RESULTS, SQL_PROMPT_SLOTS};
pub use template::{PromptError, PromptTemplate};
