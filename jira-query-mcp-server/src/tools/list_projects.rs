//! List projects tool

use crate::error::JiraMcpResult;
use crate::jira_client::IssueExecutor;
use crate::tools::{report, ToolOutcome};
use std::sync::Arc;
use tracing::{info, instrument};

/// Implementation of the list_projects tool
pub struct ListProjectsTool {
    executor: Arc<dyn IssueExecutor>,
}

impl ListProjectsTool {
    pub fn new(executor: Arc<dyn IssueExecutor>) -> Self {
        Self { executor }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self) -> JiraMcpResult<ToolOutcome> {
        let projects = self.executor.list_projects().await?;
        info!("Listing {} projects", projects.len());
        Ok(ToolOutcome::text(report::render_projects(&projects)))
    }
}
