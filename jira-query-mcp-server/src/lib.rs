//! JIRA Query MCP Server Library
//!
//! A Model Context Protocol server that lets AI agents query JIRA either with
//! raw JQL or with plain-English questions. Questions are resolved against a
//! YAML knowledge store of phrase patterns mapped to JQL.
//!
//! ## Features
//!
//! - **Question answering**: first-match phrase lookup in an ordered knowledge store
//! - **Raw JQL**: paginated searches capped per call and per server
//! - **Hot reload**: the knowledge store can be re-read without a restart
//! - **Error containment**: tool failures become failure-flagged text, never crashes

use crate::config::ServerConfig;
use crate::dispatcher::ToolDispatcher;
use crate::error::JiraMcpResult;
use crate::jira_client::{IssueExecutor, JiraClient};
use crate::knowledge_store::{create_store, KnowledgeStore, StoreKind};
use crate::tools::{AnswerQuestionParams, ExecuteJqlParams};

use pulseengine_mcp_macros::{mcp_server, mcp_tools};
use std::sync::Arc;
use tracing::{info, instrument};

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod jira_client;
pub mod knowledge_store;
pub mod logging;
pub mod matcher;
pub mod tools;

/// JIRA Query MCP Server
///
/// Exposes the query tools over MCP. All tool logic lives in the
/// [`ToolDispatcher`]; this type only wires components together.
#[mcp_server(
    name = "JIRA Query MCP Server",
    version = "0.1.0",
    description = "Answer questions about JIRA issues via a JQL knowledge store",
    auth = "disabled"
)]
#[derive(Clone)]
pub struct JiraQueryMcpServer {
    /// Configuration
    config: Arc<ServerConfig>,

    /// Tool routing and error containment
    dispatcher: Arc<ToolDispatcher>,
}

impl Default for JiraQueryMcpServer {
    fn default() -> Self {
        panic!(
            "JiraQueryMcpServer cannot be created with default(). Use JiraQueryMcpServer::new() instead."
        )
    }
}

impl JiraQueryMcpServer {
    /// Connect to JIRA and load the knowledge store.
    ///
    /// Fails if no credential strategy can reach the JIRA instance or if the
    /// knowledge store document cannot be parsed.
    #[instrument(skip(config))]
    pub async fn new(config: ServerConfig) -> JiraMcpResult<Self> {
        info!("Initializing JIRA Query MCP Server");
        let config = Arc::new(config);

        let jira_client = JiraClient::new(Arc::clone(&config)).await?;
        info!("JIRA client initialized");

        let kind: StoreKind = config.server.knowledge_store_type.parse()?;
        let store = create_store(kind, config.server.knowledge_store_path.clone())?;
        info!(
            "Knowledge store loaded from {} with {} query mappings",
            store.source(),
            store.len()
        );

        Ok(Self::with_components(
            config,
            Arc::new(jira_client),
            store,
        ))
    }

    /// Assemble a server from already-built parts
    pub fn with_components(
        config: impl Into<Arc<ServerConfig>>,
        executor: Arc<dyn IssueExecutor>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        let config = config.into();
        let dispatcher = ToolDispatcher::new(executor, store, Arc::clone(&config));

        Self {
            config,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The dispatcher backing every tool
    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Re-read the knowledge store document. On failure the previous
    /// mappings stay in place and the error is returned.
    pub fn reload_knowledge_store(&self) -> JiraMcpResult<usize> {
        self.dispatcher.store().reload()
    }

    /// Number of mappings currently loaded
    pub fn knowledge_store_size(&self) -> usize {
        self.dispatcher.store().len()
    }
}

/// All public methods in this impl block become MCP tools automatically
#[mcp_tools]
impl JiraQueryMcpServer {
    /// Execute a JQL query against JIRA
    ///
    /// Runs the query and returns the matching issues with key, summary,
    /// status, type, project, assignee, priority and creation time.
    ///
    /// # Examples
    /// - Open bugs: `{"jql": "project = PROJ AND type = Bug AND status != Done"}`
    /// - Ten most recent: `{"jql": "ORDER BY created DESC", "max_results": 10}`
    #[instrument(skip(self))]
    pub async fn execute_jql(&self, params: ExecuteJqlParams) -> anyhow::Result<String> {
        self.dispatcher.execute_jql(params).await.into_tool_result()
    }

    /// Answer a natural-language question about JIRA issues
    ///
    /// The question is matched against the knowledge store patterns. When a
    /// pattern occurs in the question its JQL is executed; otherwise the
    /// available query types are listed.
    ///
    /// # Examples
    /// - `{"question": "Show me all open bugs"}`
    /// - `{"question": "What's in the current sprint?", "max_results": 20}`
    #[instrument(skip(self))]
    pub async fn answer_question(&self, params: AnswerQuestionParams) -> anyhow::Result<String> {
        self.dispatcher.answer_question(params).await.into_tool_result()
    }

    /// List the JIRA projects visible to the configured account
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> anyhow::Result<String> {
        self.dispatcher.list_projects().await.into_tool_result()
    }

    /// List the query patterns available in the knowledge store
    #[instrument(skip(self))]
    pub async fn list_knowledge_queries(&self) -> anyhow::Result<String> {
        self.dispatcher.list_knowledge_queries().await.into_tool_result()
    }

    /// Test the connection to the JIRA instance
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> anyhow::Result<String> {
        self.dispatcher.test_connection().await.into_tool_result()
    }
}
