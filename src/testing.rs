//! Fakes shared by the unit tests

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::llm::{ChatRequest, ChatResponse, DecodingParams, LlmProvider, Role};
use crate::tools::sql::database::{format_table_info, SqlDatabase, SqlRow};

/// Language model that replays canned responses and records requests
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
    decoding: DecodingParams,
}

impl ScriptedLlm {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_responses(texts.into_iter().map(ChatResponse::text_reply))
    }

    pub fn with_responses(responses: impl IntoIterator<Item = ChatResponse>) -> Self {
        Self {
            replies: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            decoding: DecodingParams::deterministic(),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_user_message(&self) -> Option<String> {
        self.requests()
            .last()?
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.clone())
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => Ok(reply),
            None => bail!("script exhausted"),
        }
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn decoding(&self) -> &DecodingParams {
        &self.decoding
    }
}

/// Database with fixed tables and canned query results
#[derive(Default)]
pub struct FakeDatabase {
    tables: BTreeMap<String, String>,
    results: HashMap<String, Vec<SqlRow>>,
    executed: Mutex<Vec<String>>,
    closes: AtomicUsize,
    dialect: Option<String>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, ddl: &str) -> Self {
        self.tables.insert(name.to_string(), ddl.to_string());
        self
    }

    pub fn with_result(mut self, query: &str, rows: Vec<SqlRow>) -> Self {
        self.results.insert(query.to_string(), rows);
        self
    }

    pub fn with_dialect(mut self, dialect: &str) -> Self {
        self.dialect = Some(dialect.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlDatabase for FakeDatabase {
    fn dialect(&self) -> &str {
        self.dialect.as_deref().unwrap_or("mysql")
    }

    async fn usable_table_names(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn table_info(&self, tables: &[String]) -> Result<String> {
        let missing: Vec<&String> = tables.iter().filter(|t| !self.tables.contains_key(*t)).collect();
        if !missing.is_empty() {
            bail!("table_names {:?} not found in database", missing);
        }
        Ok(tables
            .iter()
            .map(|t| format_table_info(t, &self.tables[t], &[], &[]))
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    async fn run(&self, query: &str) -> Result<Vec<SqlRow>> {
        self.executed.lock().unwrap().push(query.to_string());
        match self.results.get(query.trim()) {
            Some(rows) => Ok(rows.clone()),
            None => bail!("(1054, \"Unknown column in 'field list'\")"),
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
