//! Test connection tool

use crate::config::ServerConfig;
use crate::error::JiraMcpResult;
use crate::jira_client::IssueExecutor;
use crate::tools::ToolOutcome;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Implementation of the test_connection tool
pub struct TestConnectionTool {
    executor: Arc<dyn IssueExecutor>,
    config: Arc<ServerConfig>,
}

impl TestConnectionTool {
    pub fn new(executor: Arc<dyn IssueExecutor>, config: Arc<ServerConfig>) -> Self {
        Self { executor, config }
    }

    /// Probe JIRA; an unreachable instance is reported as a failed outcome
    #[instrument(skip(self))]
    pub async fn execute(&self) -> JiraMcpResult<ToolOutcome> {
        if self.executor.test_connection().await? {
            info!("Connection test successful");
            Ok(ToolOutcome::text(format!(
                "✅ JIRA connection test successful!\nJIRA URL: {}",
                self.config.jira.url
            )))
        } else {
            error!("Connection test failed");
            Ok(ToolOutcome::error(format!(
                "❌ JIRA connection test failed. Please check your configuration.\n\
                 JIRA URL: {}\n\
                 \n\
                 Please check:\n\
                 - JIRA URL is correct and accessible\n\
                 - JIRA_TOKEN (and JIRA_USERNAME, if set) are valid\n\
                 - Network connectivity to JIRA instance",
                self.config.jira.url
            )))
        }
    }
}
