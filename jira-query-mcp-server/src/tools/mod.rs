//! Tools module for the JIRA Query MCP Server
//!
//! Each tool validates its arguments, talks to the knowledge store and/or the
//! issue executor, and renders a plain-text report for the calling agent.

pub mod answer_question;
pub mod execute_jql;
pub mod knowledge_queries;
pub mod list_projects;
pub mod report;
pub mod test_connection;

pub use answer_question::*;
pub use execute_jql::*;
pub use knowledge_queries::*;
pub use list_projects::*;
pub use test_connection::*;

use crate::config::MAX_RESULTS_LIMIT;
use crate::error::{JiraMcpError, JiraMcpResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Results returned when the caller does not pass `max_results`
pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Text report produced by a tool, plus whether it represents a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutcome {
    /// A successful report
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// A failure-flagged report
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Convert into the `Result` shape the MCP tool macros expect; failures
    /// become `Err` so the framework marks the response with `isError`.
    pub fn into_tool_result(self) -> anyhow::Result<String> {
        if self.is_error {
            Err(anyhow::anyhow!(self.text))
        } else {
            Ok(self.text)
        }
    }
}

impl std::fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Validate the caller's `max_results` and apply the server-wide cap
pub(crate) fn effective_limit(requested: Option<u32>, server_cap: u32) -> JiraMcpResult<u32> {
    let requested = requested.unwrap_or(DEFAULT_MAX_RESULTS);

    if requested == 0 || requested > MAX_RESULTS_LIMIT {
        return Err(JiraMcpError::invalid_param(
            "max_results",
            format!(
                "max_results must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT, requested
            ),
        ));
    }

    let limit = requested.min(server_cap);
    if limit < requested {
        debug!(
            "Capping max_results from {} to server limit {}",
            requested, limit
        );
    }

    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_defaults_and_caps() {
        assert_eq!(effective_limit(None, 100).unwrap(), 50);
        assert_eq!(effective_limit(None, 20).unwrap(), 20);
        assert_eq!(effective_limit(Some(1000), 100).unwrap(), 100);
        assert_eq!(effective_limit(Some(7), 100).unwrap(), 7);
    }

    #[test]
    fn test_effective_limit_rejects_out_of_range() {
        assert!(effective_limit(Some(0), 100).is_err());
        let err = effective_limit(Some(1001), 1000).unwrap_err();
        assert_eq!(err.category(), "invalid_parameter");
    }

    #[test]
    fn test_outcome_conversion() {
        assert_eq!(ToolOutcome::text("ok").into_tool_result().unwrap(), "ok");

        let err = ToolOutcome::error("JQL query is required")
            .into_tool_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "JQL query is required");
    }
}
