//! Execute JQL tool
//!
//! Runs a caller-supplied JQL query and renders the matching issues.

use crate::config::ServerConfig;
use crate::error::{JiraMcpError, JiraMcpResult};
use crate::jira_client::IssueExecutor;
use crate::tools::{effective_limit, report, ToolOutcome};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Parameters for the execute_jql tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecuteJqlParams {
    /// The JQL query string to execute (required)
    /// Examples: "project = OPS AND status = Open", "assignee = currentUser() ORDER BY updated DESC"
    pub jql: String,

    /// Maximum number of results to return (optional, default: 50, range: 1-1000)
    pub max_results: Option<u32>,
}

/// Implementation of the execute_jql tool
pub struct ExecuteJqlTool {
    executor: Arc<dyn IssueExecutor>,
    config: Arc<ServerConfig>,
}

impl ExecuteJqlTool {
    /// Create a new execute_jql tool
    pub fn new(executor: Arc<dyn IssueExecutor>, config: Arc<ServerConfig>) -> Self {
        Self { executor, config }
    }

    /// Execute the execute_jql tool
    #[instrument(skip(self), fields(jql = %params.jql))]
    pub async fn execute(&self, params: ExecuteJqlParams) -> JiraMcpResult<ToolOutcome> {
        let jql = params.jql.trim();
        if jql.is_empty() {
            return Err(JiraMcpError::invalid_param("jql", "JQL query is required"));
        }

        let limit = effective_limit(params.max_results, self.config.server.max_results)?;

        info!("Executing JQL query with limit {}", limit);
        let result = self.executor.execute_jql(jql, limit, None).await?;

        Ok(ToolOutcome::text(report::render_search(
            &[("JQL Query", jql)],
            &result,
        )))
    }
}
