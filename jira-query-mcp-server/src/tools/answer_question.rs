//! Answer question tool
//!
//! Resolves a natural-language question to a curated JQL query through the
//! knowledge store, then runs it. Questions that match nothing get a list of
//! the query types the store does know about.

use crate::config::ServerConfig;
use crate::error::{JiraMcpError, JiraMcpResult};
use crate::jira_client::IssueExecutor;
use crate::knowledge_store::KnowledgeStore;
use crate::matcher;
use crate::tools::{effective_limit, report, ToolOutcome};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Parameters for the answer_question tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnswerQuestionParams {
    /// The question about JIRA data you want to answer (required)
    /// Examples: "show me open bugs", "what is blocked in the current sprint?"
    pub question: String,

    /// Maximum number of results to return (optional, default: 50, range: 1-1000)
    pub max_results: Option<u32>,
}

/// Implementation of the answer_question tool
pub struct AnswerQuestionTool {
    executor: Arc<dyn IssueExecutor>,
    store: Arc<dyn KnowledgeStore>,
    config: Arc<ServerConfig>,
}

impl AnswerQuestionTool {
    /// Create a new answer_question tool
    pub fn new(
        executor: Arc<dyn IssueExecutor>,
        store: Arc<dyn KnowledgeStore>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            executor,
            store,
            config,
        }
    }

    /// Execute the answer_question tool
    #[instrument(skip(self), fields(question = %params.question))]
    pub async fn execute(&self, params: AnswerQuestionParams) -> JiraMcpResult<ToolOutcome> {
        let question = params.question.trim();
        if question.is_empty() {
            return Err(JiraMcpError::invalid_param("question", "Question is required"));
        }

        let limit = effective_limit(params.max_results, self.config.server.max_results)?;

        let mappings = self.store.snapshot();
        let Some(mapping) = matcher::resolve(question, &mappings) else {
            info!("No knowledge store mapping matched the question");
            return Ok(ToolOutcome::text(report::render_no_match(
                question, &mappings,
            )));
        };

        info!("Question matched mapping '{}'", mapping.description);
        let result = self
            .executor
            .execute_jql(&mapping.jql_query, limit, None)
            .await?;

        Ok(ToolOutcome::text(report::render_search(
            &[("Question", question), ("Matched JQL", mapping.jql_query.as_str())],
            &result,
        )))
    }
}
