//! JIRA client wrapper around gouqi
//!
//! Provides the [`IssueExecutor`] seam the tools depend on, and a gouqi-backed
//! implementation with an authentication fallback chain, paginated JQL search,
//! request timeouts and retry with exponential backoff.

use crate::config::{JiraSettings, ServerConfig};
use crate::error::{JiraMcpError, JiraMcpResult};
use async_trait::async_trait;
use gouqi::r#async::Jira;
use gouqi::{Credentials, Issue, SearchOptions};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// JIRA rejects search pages larger than this
const SEARCH_PAGE_SIZE: usize = 100;

/// Result of running a JQL query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JqlSearchResult {
    /// The JQL that was executed
    pub jql: String,
    /// Total matches reported by JIRA (may exceed `issues.len()`)
    pub total: usize,
    /// Limit the query was run with
    pub max_results: u32,
    pub issues: Vec<IssueInfo>,
}

/// Issue fields used for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueInfo {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub issue_type: String,
    pub project_key: String,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub created: String,
    pub updated: String,
}

/// Project summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub lead: Option<String>,
}

/// Response of `GET /serverInfo`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInfo {
    pub base_url: Option<String>,
    pub version: Option<String>,
    pub server_title: Option<String>,
    pub deployment_type: Option<String>,
}

/// Project as returned by `GET /project?expand=description,lead`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    key: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    lead: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawProject> for ProjectInfo {
    fn from(raw: RawProject) -> Self {
        ProjectInfo {
            key: raw.key,
            name: raw.name,
            description: non_empty(raw.description),
            lead: raw
                .lead
                .and_then(|user| non_empty(user.display_name).or(non_empty(user.name))),
        }
    }
}

/// Operations the tools need from the issue tracker
#[async_trait]
pub trait IssueExecutor: Send + Sync {
    /// Run `jql`, returning at most `max_results` issues
    async fn execute_jql(
        &self,
        jql: &str,
        max_results: u32,
        expand: Option<&[String]>,
    ) -> JiraMcpResult<JqlSearchResult>;

    /// List the projects visible to the authenticated user
    async fn list_projects(&self) -> JiraMcpResult<Vec<ProjectInfo>>;

    /// Check that the tracker answers with the configured credentials
    async fn test_connection(&self) -> JiraMcpResult<bool>;
}

/// Backoff settings for upstream requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (0-based), without jitter
    pub fn base_delay(&self, retry: usize) -> Duration {
        let factor = 1u32.checked_shl(retry as u32).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jittered_delay(&self, retry: usize) -> Duration {
        let base = self.base_delay(retry);
        let spread = (base.as_millis() / 4) as u64;
        if spread == 0 {
            return base;
        }
        let jitter = rand::rng().random_range(0..=spread);
        (base + Duration::from_millis(jitter)).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    operation: F,
) -> JiraMcpResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = JiraMcpResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.jittered_delay(attempt - 1);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {}ms: {}",
                    operation_name,
                    attempt,
                    max_attempts,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempt > 1 {
                    warn!("{} failed after {} attempts: {}", operation_name, attempt, e);
                }
                return Err(e);
            }
        }
    }
}

/// Credentials to try, in order, for the configured account
fn credential_chain(settings: &JiraSettings) -> Vec<(&'static str, Credentials)> {
    let mut chain = vec![("bearer token", Credentials::Bearer(settings.token.clone()))];

    if let Some(username) = &settings.username {
        chain.push((
            "basic auth",
            Credentials::Basic(username.clone(), settings.token.clone()),
        ));
    }

    chain
}

/// gouqi-backed issue executor
#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(crate) client: Arc<Jira>,
    config: Arc<ServerConfig>,
    retry: RetryPolicy,
}

impl JiraClient {
    /// Create a client, trying each credential in the fallback chain until
    /// the instance answers `/serverInfo`.
    #[instrument(skip_all, fields(url = %config.jira.url))]
    pub async fn new(config: Arc<ServerConfig>) -> JiraMcpResult<Self> {
        info!("Initializing JIRA client for URL: {}", config.jira.url);

        let mut failures = Vec::new();

        for (label, credentials) in credential_chain(&config.jira) {
            debug!("Attempting {} authentication", label);

            let jira = Jira::new(&config.jira.url, credentials).map_err(JiraMcpError::from)?;
            let candidate = Self {
                client: Arc::new(jira),
                config: Arc::clone(&config),
                retry: RetryPolicy::default(),
            };

            match candidate.server_info().await {
                Ok(server) => {
                    info!(
                        "JIRA client initialized using {} (server version: {})",
                        label,
                        server.version.as_deref().unwrap_or("unknown")
                    );
                    return Ok(candidate);
                }
                Err(e) => {
                    warn!("{} authentication failed: {}", label, e);
                    failures.push(format!("{}: {}", label, e));
                }
            }
        }

        Err(JiraMcpError::auth(format!(
            "could not connect to {} ({})",
            config.jira.url,
            failures.join("; ")
        )))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.jira.request_timeout_seconds)
    }

    async fn with_timeout<T, Fut>(&self, what: &str, request: Fut) -> JiraMcpResult<T>
    where
        Fut: Future<Output = Result<T, gouqi::Error>>,
    {
        timeout(self.request_timeout(), request)
            .await
            .map_err(|_| JiraMcpError::network(format!("Timeout during {}", what)))?
            .map_err(JiraMcpError::from)
    }

    /// Fetch server information; used as the connectivity check
    #[instrument(skip_all)]
    pub async fn server_info(&self) -> JiraMcpResult<ServerInfo> {
        self.with_timeout("server info request", self.client.get("api", "/serverInfo"))
            .await
    }

    async fn search_page(
        &self,
        jql: &str,
        start_at: usize,
        page_size: usize,
        expand: Option<&[String]>,
    ) -> JiraMcpResult<gouqi::SearchResults> {
        retry_with_backoff(&self.retry, "JQL search", || async move {
            let options = match expand {
                Some(fields) => SearchOptions::builder()
                    .start_at(start_at as u64)
                    .max_results(page_size as u64)
                    .expand(fields.to_vec())
                    .build(),
                None => SearchOptions::builder()
                    .start_at(start_at as u64)
                    .max_results(page_size as u64)
                    .build(),
            };

            self.with_timeout("search", self.client.search().list(jql, &options))
                .await
        })
        .await
    }
}

#[async_trait]
impl IssueExecutor for JiraClient {
    #[instrument(skip(self))]
    async fn execute_jql(
        &self,
        jql: &str,
        max_results: u32,
        expand: Option<&[String]>,
    ) -> JiraMcpResult<JqlSearchResult> {
        let limit = max_results as usize;
        let mut issues: Vec<IssueInfo> = Vec::with_capacity(limit.min(SEARCH_PAGE_SIZE));
        let mut total = 0usize;

        debug!("Executing JQL query: '{}' (max {})", jql, limit);

        while issues.len() < limit {
            let page_size = (limit - issues.len()).min(SEARCH_PAGE_SIZE);
            let page = self
                .search_page(jql, issues.len(), page_size, expand)
                .await
                .inspect_err(|e| error!("JQL query failed: {} ({})", jql, e))?;

            total = page.total as usize;
            let fetched = page.issues.len();
            issues.extend(page.issues.iter().map(convert_issue_info));

            if fetched == 0 || issues.len() >= total {
                break;
            }
        }

        issues.truncate(limit);

        info!(
            "JQL query returned {} issues (total: {})",
            issues.len(),
            total
        );

        Ok(JqlSearchResult {
            jql: jql.to_string(),
            total,
            max_results,
            issues,
        })
    }

    #[instrument(skip(self))]
    async fn list_projects(&self) -> JiraMcpResult<Vec<ProjectInfo>> {
        let projects: Vec<RawProject> = retry_with_backoff(&self.retry, "list projects", || {
            self.with_timeout(
                "project listing",
                self.client.get("api", "/project?expand=description,lead"),
            )
        })
        .await
        .inspect_err(|e| error!("Failed to get projects: {}", e))?;

        debug!("Fetched {} projects", projects.len());
        Ok(projects.into_iter().map(ProjectInfo::from).collect())
    }

    #[instrument(skip(self))]
    async fn test_connection(&self) -> JiraMcpResult<bool> {
        match self.server_info().await {
            Ok(server) => {
                info!(
                    "JIRA connection test successful (server version: {})",
                    server.version.as_deref().unwrap_or("unknown")
                );
                Ok(true)
            }
            Err(e) => {
                error!("JIRA connection test failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Convert a gouqi issue; blank optional fields become `None` here so the
/// renderers never have to re-check them.
fn convert_issue_info(issue: &Issue) -> IssueInfo {
    IssueInfo {
        key: issue.key.clone(),
        summary: issue.summary().unwrap_or_default(),
        status: issue.status().map(|s| s.name.clone()).unwrap_or_default(),
        issue_type: issue
            .issue_type()
            .map(|it| it.name.clone())
            .unwrap_or_default(),
        project_key: issue.project().map(|p| p.key.clone()).unwrap_or_default(),
        assignee: non_empty(issue.assignee().map(|u| u.display_name.clone())),
        reporter: non_empty(issue.reporter().map(|u| u.display_name.clone())),
        priority: non_empty(issue.priority().map(|p| p.name.clone())),
        description: non_empty(issue.description()),
        created: raw_string_field(issue, "created"),
        updated: raw_string_field(issue, "updated"),
    }
}

/// Timestamps are passed through exactly as JIRA reports them
fn raw_string_field(issue: &Issue, name: &str) -> String {
    issue
        .field::<String>(name)
        .and_then(|result| result.ok())
        .unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_credential_chain_order() {
        let mut settings = JiraSettings {
            url: "https://jira.example.com".to_string(),
            token: "t0ken".to_string(),
            ..Default::default()
        };

        let labels: Vec<&str> = credential_chain(&settings).iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["bearer token"]);

        settings.username = Some("bot".to_string());
        let labels: Vec<&str> = credential_chain(&settings).iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["bearer token", "basic auth"]);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay(2), Duration::from_secs(4));
        assert_eq!(policy.base_delay(4), Duration::from_secs(10));
        assert_eq!(policy.base_delay(64), Duration::from_secs(10));

        for retry in 0..5 {
            let delay = policy.jittered_delay(retry);
            assert!(delay >= policy.base_delay(retry));
            assert!(delay <= policy.max_delay);
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let calls = AtomicUsize::new(0);

        let result = retry_with_backoff(&fast_policy(), "flaky", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(JiraMcpError::network("connection reset"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);

        let result: JiraMcpResult<()> = retry_with_backoff(&fast_policy(), "down", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(JiraMcpError::rate_limit(1))
        })
        .await;

        assert!(matches!(result, Err(JiraMcpError::RateLimit { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bad_jql_is_not_retried() {
        let calls = AtomicUsize::new(0);

        let result: JiraMcpResult<()> = retry_with_backoff(&fast_policy(), "search", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(JiraMcpError::jql("The value 'NOPE' does not exist for the field 'project'"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_project_conversion() {
        let raw: Vec<RawProject> = serde_json::from_value(serde_json::json!([
            {
                "key": "OPS",
                "name": "Operations",
                "description": "Runbooks and incidents",
                "lead": {"displayName": "Dana Ops", "name": "dops"}
            },
            {"key": "WEB", "name": "Website", "description": "", "lead": {"name": "webmaster"}},
            {"key": "LAB", "name": "Lab"}
        ]))
        .unwrap();

        let projects: Vec<ProjectInfo> = raw.into_iter().map(ProjectInfo::from).collect();

        assert_eq!(projects[0].description.as_deref(), Some("Runbooks and incidents"));
        assert_eq!(projects[0].lead.as_deref(), Some("Dana Ops"));
        assert_eq!(projects[1].description, None);
        assert_eq!(projects[1].lead.as_deref(), Some("webmaster"));
        assert_eq!(projects[2].lead, None);
    }

    #[test]
    fn test_server_info_tolerates_missing_fields() {
        let info: ServerInfo =
            serde_json::from_value(serde_json::json!({"version": "9.12.2"})).unwrap();
        assert_eq!(info.version.as_deref(), Some("9.12.2"));
        assert_eq!(info.base_url, None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("High".to_string())), Some("High".to_string()));
    }
}
