//! Agent factory
//!
//! Turns a validated connection configuration into a ready SQL agent
//! session, or a model name into a code agent session. Capabilities (model,
//! database, history store) come from a [`CapabilityProvider`] so the
//! factory can be exercised without network access.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::react::ReActParser;
use super::session::{AgentSession, Strategy};
use crate::config::{validate, AgentSettings, ConnectionConfig, ConnectionUri, HistoryTable, Secrets, ValidatedConfig};
use crate::core::{AgentInitError, SetupError};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::memory::{ChatHistoryStore, ConversationMemory, MySqlChatHistory};
use crate::prompt::{sql_agent_prompt, CODE_AGENT_INSTRUCTIONS};
use crate::tools::{register_sql_toolkit, MySqlDatabase, PythonReplTool, SqlDatabase, ToolRegistry};

/// Source of the external collaborators an agent is bound to
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Chat model with the settings' decoding parameters
    async fn language_model(
        &self,
        secrets: &Secrets,
        model: &str,
        settings: &AgentSettings,
    ) -> Result<Arc<dyn LlmProvider>>;

    /// Open the database the SQL tools query
    async fn open_database(&self, uri: &ConnectionUri) -> Result<Arc<dyn SqlDatabase>>;

    /// Open the history store for one session
    async fn open_history(
        &self,
        uri: &ConnectionUri,
        table: &HistoryTable,
        session_id: &str,
    ) -> Result<Arc<dyn ChatHistoryStore>>;
}

/// OpenAI-compatible model, MySQL database and MySQL history
pub struct LiveCapabilities;

#[async_trait]
impl CapabilityProvider for LiveCapabilities {
    async fn language_model(
        &self,
        secrets: &Secrets,
        model: &str,
        settings: &AgentSettings,
    ) -> Result<Arc<dyn LlmProvider>> {
        let provider = OpenAiProvider::new(secrets.openai_api_key())
            .with_model(model)
            .with_endpoint(settings.api_base.clone())
            .with_decoding(settings.decoding.clone());
        Ok(Arc::new(provider))
    }

    async fn open_database(&self, uri: &ConnectionUri) -> Result<Arc<dyn SqlDatabase>> {
        Ok(Arc::new(MySqlDatabase::connect(uri).await?))
    }

    async fn open_history(
        &self,
        uri: &ConnectionUri,
        table: &HistoryTable,
        session_id: &str,
    ) -> Result<Arc<dyn ChatHistoryStore>> {
        Ok(Arc::new(MySqlChatHistory::connect(uri, table.clone(), session_id).await?))
    }
}

/// Builds agent sessions from configuration and injected secrets
pub struct AgentFactory {
    capabilities: Arc<dyn CapabilityProvider>,
    secrets: Secrets,
    settings: AgentSettings,
}

impl AgentFactory {
    pub fn new(capabilities: Arc<dyn CapabilityProvider>, secrets: Secrets, settings: AgentSettings) -> Self {
        Self {
            capabilities,
            secrets,
            settings,
        }
    }

    /// Factory over the live OpenAI and MySQL capabilities
    pub fn live(secrets: Secrets, settings: AgentSettings) -> Self {
        Self::new(Arc::new(LiveCapabilities), secrets, settings)
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Validate a raw mapping, then create the SQL agent
    pub async fn sql_agent_from_value(&self, raw: &Value) -> Result<AgentSession, SetupError> {
        let config = validate(Some(raw))?;
        Ok(self.create_sql_agent(&config).await?)
    }

    /// Validate a structured config, then create the SQL agent
    pub async fn sql_agent_from_config(&self, config: ConnectionConfig) -> Result<AgentSession, SetupError> {
        let config = config.validate()?;
        Ok(self.create_sql_agent(&config).await?)
    }

    /// Create a SQL agent bound to the configured database
    ///
    /// The database and the history store share one connection URI. If any
    /// step fails, whatever was already opened is closed before the error
    /// is returned.
    pub async fn create_sql_agent(&self, config: &ValidatedConfig) -> Result<AgentSession, AgentInitError> {
        tracing::info!(
            "[AgentFactory] Creating SQL agent for {}@{}:{}/{}",
            config.user(),
            config.host(),
            config.port(),
            config.database()
        );

        let llm = self
            .capabilities
            .language_model(&self.secrets, &self.settings.model, &self.settings)
            .await
            .map_err(init_failed)?;

        let uri = ConnectionUri::build(config);

        let database = self.capabilities.open_database(&uri).await.map_err(init_failed)?;

        let history = match self
            .capabilities
            .open_history(&uri, &self.settings.history_table, &self.settings.session_id)
            .await
        {
            Ok(history) => history,
            Err(e) => {
                database.close().await;
                return Err(init_failed(e));
            }
        };

        match self.assemble_sql_session(llm, database.clone(), history.clone()) {
            Ok(session) => {
                tracing::info!(
                    "[AgentFactory] SQL agent ready (session {}, tools: {})",
                    session.session_id(),
                    session.tool_names().join(", ")
                );
                Ok(session)
            }
            Err(e) => {
                history.close().await;
                database.close().await;
                Err(init_failed(e))
            }
        }
    }

    fn assemble_sql_session(
        &self,
        llm: Arc<dyn LlmProvider>,
        database: Arc<dyn SqlDatabase>,
        history: Arc<dyn ChatHistoryStore>,
    ) -> Result<AgentSession> {
        let mut tools = ToolRegistry::new();
        register_sql_toolkit(&mut tools, database.clone(), llm.clone())?;

        let prompt = sql_agent_prompt(
            database.dialect(),
            self.settings.top_k,
            &tools.describe(),
            &tools.tool_names().join(", "),
            &self.settings.domain_hints,
        )?;

        let strategy = Strategy::React {
            prompt,
            parser: ReActParser::new()?,
        };
        let memory = ConversationMemory::new(history, self.settings.history_window);

        Ok(AgentSession::new(
            self.settings.session_id.clone(),
            llm,
            tools,
            strategy,
            self.settings.max_iterations,
        )
        .with_memory(memory)
        .with_database(database))
    }

    /// Create a stateless code agent with a sandboxed Python tool
    pub async fn create_code_agent(&self, model_name: &str) -> Result<AgentSession, AgentInitError> {
        tracing::info!("[AgentFactory] Creating code agent with model {}", model_name);

        let llm = self
            .capabilities
            .language_model(&self.secrets, model_name, &self.settings)
            .await
            .map_err(init_failed)?;

        let mut tools = ToolRegistry::new();
        tools.register(PythonReplTool::new(
            self.settings.python_bin.clone(),
            self.settings.python_timeout,
        ));

        let session_id = format!("code-{}", uuid::Uuid::new_v4());
        Ok(AgentSession::new(
            session_id,
            llm,
            tools,
            Strategy::Functions {
                system_prompt: CODE_AGENT_INSTRUCTIONS.to_string(),
            },
            self.settings.max_iterations,
        ))
    }
}

fn init_failed(err: anyhow::Error) -> AgentInitError {
    tracing::error!("[AgentFactory] Agent initialization failed: {:#}", err);
    AgentInitError::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigError;
    use crate::memory::InMemoryChatHistory;
    use crate::testing::{FakeDatabase, ScriptedLlm};
    use anyhow::bail;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// History store that counts closes
    #[derive(Default)]
    struct CountingHistory {
        inner: InMemoryChatHistory,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChatHistoryStore for CountingHistory {
        async fn messages(&self) -> Result<Vec<crate::memory::HistoryMessage>> {
            self.inner.messages().await
        }

        async fn add_message(&self, message: crate::memory::HistoryMessage) -> Result<()> {
            self.inner.add_message(message).await
        }

        async fn clear(&self) -> Result<()> {
            self.inner.clear().await
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeCapabilities {
        fail_model: bool,
        fail_database: bool,
        fail_history: bool,
        database: Arc<FakeDatabase>,
        history_closes: Arc<AtomicUsize>,
        opens: AtomicUsize,
        uris: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CapabilityProvider for FakeCapabilities {
        async fn language_model(
            &self,
            _secrets: &Secrets,
            _model: &str,
            _settings: &AgentSettings,
        ) -> Result<Arc<dyn LlmProvider>> {
            if self.fail_model {
                bail!("model unavailable");
            }
            Ok(Arc::new(ScriptedLlm::new(["Final Answer: 7"])))
        }

        async fn open_database(&self, uri: &ConnectionUri) -> Result<Arc<dyn SqlDatabase>> {
            self.uris.lock().unwrap().push(uri.expose().to_string());
            if self.fail_database {
                bail!("connection refused");
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(self.database.clone())
        }

        async fn open_history(
            &self,
            uri: &ConnectionUri,
            _table: &HistoryTable,
            _session_id: &str,
        ) -> Result<Arc<dyn ChatHistoryStore>> {
            self.uris.lock().unwrap().push(uri.expose().to_string());
            if self.fail_history {
                bail!("history table locked");
            }
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CountingHistory {
                inner: InMemoryChatHistory::new(),
                closes: self.history_closes.clone(),
            }))
        }
    }

    fn factory(capabilities: Arc<FakeCapabilities>) -> AgentFactory {
        AgentFactory::new(capabilities, Secrets::new("sk-test"), AgentSettings::new())
    }

    fn raw_config() -> Value {
        json!({ "USER": "u", "PASSWORD": "p@ss", "HOST": "h", "DATABASE": "d", "PORT": "3306" })
    }

    #[tokio::test]
    async fn test_sql_agent_is_bound_and_answers() {
        let caps = Arc::new(FakeCapabilities::default());
        let mut session = factory(caps.clone())
            .sql_agent_from_value(&raw_config())
            .await
            .unwrap();

        assert_eq!(session.session_id(), "my-session");
        assert!(session.has_memory());
        assert_eq!(session.tool_names().len(), 4);
        assert_eq!(session.invoke("how many?").await.unwrap(), "7");

        session.close().await;
        assert_eq!(caps.database.close_count(), 1);
        assert_eq!(caps.history_closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_sinks_get_the_same_uri() {
        let caps = Arc::new(FakeCapabilities::default());
        let session = factory(caps.clone())
            .sql_agent_from_value(&raw_config())
            .await
            .unwrap();
        session.close().await;

        let uris = caps.uris.lock().unwrap().clone();
        assert_eq!(uris, vec!["mysql://u:p%40ss@h:3306/d"; 2]);
    }

    #[tokio::test]
    async fn test_invalid_config_touches_no_capability() {
        let caps = Arc::new(FakeCapabilities::default());
        let err = factory(caps.clone())
            .sql_agent_from_value(&json!({}))
            .await
            .unwrap_err();

        assert_eq!(err, SetupError::Config(ConfigError::MissingField("USER".into())));
        assert!(caps.uris.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_opens_nothing() {
        let caps = Arc::new(FakeCapabilities {
            fail_model: true,
            ..Default::default()
        });
        let err = factory(caps.clone())
            .sql_agent_from_value(&raw_config())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::Init(ref e) if e.cause.contains("model unavailable")));
        assert_eq!(caps.opens.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_database_failure_is_init_error() {
        let caps = Arc::new(FakeCapabilities {
            fail_database: true,
            ..Default::default()
        });
        let err = factory(caps.clone())
            .sql_agent_from_value(&raw_config())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::Init(ref e) if e.cause.contains("connection refused")));
        assert_eq!(caps.database.close_count(), 0);
    }

    #[tokio::test]
    async fn test_history_failure_releases_database() {
        let caps = Arc::new(FakeCapabilities {
            fail_history: true,
            ..Default::default()
        });
        let config = ConnectionConfig::new("u", "p", "h", "d", "3306").validate().unwrap();
        let err = factory(caps.clone()).create_sql_agent(&config).await.unwrap_err();

        assert!(err.cause.contains("history table locked"));
        assert_eq!(caps.opens.load(Ordering::SeqCst), 1);
        assert_eq!(caps.database.close_count(), 1);
    }

    #[tokio::test]
    async fn test_assembly_failure_releases_history_and_database() {
        let caps = Arc::new(FakeCapabilities {
            database: Arc::new(FakeDatabase::new().with_dialect("")),
            ..Default::default()
        });
        let err = factory(caps.clone())
            .sql_agent_from_value(&raw_config())
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::Init(ref e) if e.cause.contains("dialect")));
        assert_eq!(caps.opens.load(Ordering::SeqCst), 2);
        assert_eq!(caps.history_closes.load(Ordering::SeqCst), 1);
        assert_eq!(caps.database.close_count(), 1);
    }

    #[tokio::test]
    async fn test_code_agent_has_python_and_no_memory() {
        let caps = Arc::new(FakeCapabilities::default());
        let session = factory(caps.clone()).create_code_agent("gpt-4o").await.unwrap();

        assert_eq!(session.tool_names(), vec!["Python_REPL"]);
        assert!(!session.has_memory());
        assert!(session.session_id().starts_with("code-"));
        assert!(caps.uris.lock().unwrap().is_empty());
    }
}
