/// Common utilities for JIRA Query MCP Server integration tests
use async_trait::async_trait;
use jira_query_mcp_server::config::ServerConfig;
use jira_query_mcp_server::error::{JiraMcpError, JiraMcpResult};
use jira_query_mcp_server::jira_client::{IssueExecutor, IssueInfo, JqlSearchResult, ProjectInfo};
use jira_query_mcp_server::knowledge_store::{KnowledgeStore, YamlKnowledgeStore};
use jira_query_mcp_server::JiraQueryMcpServer;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Knowledge store document used by most tests
#[allow(dead_code)]
pub const SAMPLE_STORE: &str = r#"
queries:
  - question_patterns: ["open bugs", "active bugs"]
    jql_query: "type = Bug AND status != Done"
    description: "Find open bugs"
    examples: ["Show me open bugs"]
  - question_patterns: ["my issues", "assigned to me"]
    jql_query: "assignee = currentUser() AND resolution = Unresolved"
    description: "Issues assigned to the current user"
  - question_patterns: ["current sprint"]
    jql_query: "sprint in openSprints()"
    description: "Work in the active sprint"
"#;

/// In-memory issue executor that records every call
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct MockExecutor {
    pub issues: Vec<IssueInfo>,
    pub total: Option<usize>,
    pub projects: Vec<ProjectInfo>,
    pub connected: bool,
    pub failure: Option<String>,
    pub calls: AtomicUsize,
    pub last_jql: Mutex<Option<(String, u32)>>,
}

#[allow(dead_code)]
impl MockExecutor {
    pub fn new() -> Self {
        Self {
            connected: true,
            ..Default::default()
        }
    }

    pub fn with_issues(mut self, issues: Vec<IssueInfo>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_projects(mut self, projects: Vec<ProjectInfo>) -> Self {
        self.projects = projects;
        self
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Every call fails with a network error carrying `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_jql(&self) -> Option<(String, u32)> {
        self.last_jql.lock().unwrap().clone()
    }

    fn record(&self) -> JiraMcpResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(JiraMcpError::network(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IssueExecutor for MockExecutor {
    async fn execute_jql(
        &self,
        jql: &str,
        max_results: u32,
        _expand: Option<&[String]>,
    ) -> JiraMcpResult<JqlSearchResult> {
        *self.last_jql.lock().unwrap() = Some((jql.to_string(), max_results));
        self.record()?;

        let issues: Vec<IssueInfo> = self
            .issues
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect();
        Ok(JqlSearchResult {
            jql: jql.to_string(),
            total: self.total.unwrap_or(self.issues.len()),
            max_results,
            issues,
        })
    }

    async fn list_projects(&self) -> JiraMcpResult<Vec<ProjectInfo>> {
        self.record()?;
        Ok(self.projects.clone())
    }

    async fn test_connection(&self) -> JiraMcpResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.connected && self.failure.is_none())
    }
}

/// Build an issue with the usual fields filled in
#[allow(dead_code)]
pub fn issue(key: &str, summary: &str) -> IssueInfo {
    IssueInfo {
        key: key.to_string(),
        summary: summary.to_string(),
        status: "Open".to_string(),
        issue_type: "Bug".to_string(),
        project_key: key.split('-').next().unwrap_or_default().to_string(),
        assignee: Some("Test User".to_string()),
        priority: Some("High".to_string()),
        created: "2023-01-01T10:00:00.000+0000".to_string(),
        ..Default::default()
    }
}

/// Write `contents` to a temporary YAML file
#[allow(dead_code)]
pub fn store_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[allow(dead_code)]
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.jira.url = "https://jira.example.com".to_string();
    config.jira.token = "test-token".to_string();
    config
}

/// Server wired to `executor` and a YAML store loaded from `file`
#[allow(dead_code)]
pub fn server_with(executor: Arc<MockExecutor>, file: &NamedTempFile) -> JiraQueryMcpServer {
    let store: Arc<dyn KnowledgeStore> = Arc::new(YamlKnowledgeStore::new(file.path()).unwrap());
    JiraQueryMcpServer::with_components(test_config(), executor, store)
}
