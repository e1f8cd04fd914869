//! Tool dispatcher
//!
//! Owns the tool implementations, routes calls by tool name and contains
//! failures: every error a tool raises becomes a failure-flagged text
//! outcome naming the tool, so no call can take the server down.

use crate::config::ServerConfig;
use crate::error::{JiraMcpError, JiraMcpResult};
use crate::jira_client::IssueExecutor;
use crate::knowledge_store::KnowledgeStore;
use crate::tools::{
    AnswerQuestionParams, AnswerQuestionTool, ExecuteJqlParams, ExecuteJqlTool,
    ListKnowledgeQueriesTool, ListProjectsTool, TestConnectionTool, ToolOutcome,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub struct ToolDispatcher {
    store: Arc<dyn KnowledgeStore>,
    execute_jql_tool: ExecuteJqlTool,
    answer_question_tool: AnswerQuestionTool,
    list_projects_tool: ListProjectsTool,
    knowledge_queries_tool: ListKnowledgeQueriesTool,
    test_connection_tool: TestConnectionTool,
}

impl ToolDispatcher {
    pub fn new(
        executor: Arc<dyn IssueExecutor>,
        store: Arc<dyn KnowledgeStore>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            execute_jql_tool: ExecuteJqlTool::new(Arc::clone(&executor), Arc::clone(&config)),
            answer_question_tool: AnswerQuestionTool::new(
                Arc::clone(&executor),
                Arc::clone(&store),
                Arc::clone(&config),
            ),
            list_projects_tool: ListProjectsTool::new(Arc::clone(&executor)),
            knowledge_queries_tool: ListKnowledgeQueriesTool::new(Arc::clone(&store)),
            test_connection_tool: TestConnectionTool::new(executor, config),
            store,
        }
    }

    /// The knowledge store the tools read from
    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    pub async fn execute_jql(&self, params: ExecuteJqlParams) -> ToolOutcome {
        contain("execute_jql", self.execute_jql_tool.execute(params).await)
    }

    pub async fn answer_question(&self, params: AnswerQuestionParams) -> ToolOutcome {
        contain(
            "answer_question",
            self.answer_question_tool.execute(params).await,
        )
    }

    pub async fn list_projects(&self) -> ToolOutcome {
        contain("list_projects", self.list_projects_tool.execute().await)
    }

    pub async fn list_knowledge_queries(&self) -> ToolOutcome {
        contain(
            "list_knowledge_queries",
            self.knowledge_queries_tool.execute().await,
        )
    }

    pub async fn test_connection(&self) -> ToolOutcome {
        contain("test_connection", self.test_connection_tool.execute().await)
    }

    /// Dispatch a raw MCP tool call. Missing string arguments are treated as
    /// empty so the tools report them as validation failures.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> ToolOutcome {
        debug!("Dispatching tool call: {}", name);

        match name {
            "execute_jql" => match max_results_arg(arguments) {
                Ok(max_results) => {
                    self.execute_jql(ExecuteJqlParams {
                        jql: string_arg(arguments, "jql"),
                        max_results,
                    })
                    .await
                }
                Err(e) => contain(name, Err(e)),
            },
            "answer_question" => match max_results_arg(arguments) {
                Ok(max_results) => {
                    self.answer_question(AnswerQuestionParams {
                        question: string_arg(arguments, "question"),
                        max_results,
                    })
                    .await
                }
                Err(e) => contain(name, Err(e)),
            },
            "list_projects" => self.list_projects().await,
            "list_knowledge_queries" => self.list_knowledge_queries().await,
            "test_connection" => self.test_connection().await,
            _ => {
                let e = JiraMcpError::unknown_tool(name);
                error!(tool = name, "{}", e);
                ToolOutcome::error(e.to_string())
            }
        }
    }
}

/// Turn a tool result into an outcome, converting errors into failure text
fn contain(tool: &str, result: JiraMcpResult<ToolOutcome>) -> ToolOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                tool,
                code = e.error_code(),
                data = %e.error_data(),
                "Tool execution failed: {}",
                e
            );
            ToolOutcome::error(format!("Error executing {}: {}", tool, e))
        }
    }
}

fn string_arg(arguments: &Value, key: &str) -> String {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn max_results_arg(arguments: &Value) -> JiraMcpResult<Option<u32>> {
    match arguments.get("max_results") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(u32::try_from(n).unwrap_or(u32::MAX)))
            .ok_or_else(|| {
                JiraMcpError::invalid_param(
                    "max_results",
                    format!("expected a positive integer, got {}", value),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_arg() {
        let args = json!({"jql": "project = OPS", "max_results": 5});
        assert_eq!(string_arg(&args, "jql"), "project = OPS");
        assert_eq!(string_arg(&args, "question"), "");
        assert_eq!(string_arg(&args, "max_results"), "");
        assert_eq!(string_arg(&Value::Null, "jql"), "");
    }

    #[test]
    fn test_max_results_arg() {
        assert_eq!(max_results_arg(&json!({})).unwrap(), None);
        assert_eq!(max_results_arg(&json!({"max_results": null})).unwrap(), None);
        assert_eq!(max_results_arg(&json!({"max_results": 25})).unwrap(), Some(25));
        assert_eq!(
            max_results_arg(&json!({"max_results": 10_000_000_000u64})).unwrap(),
            Some(u32::MAX)
        );
        assert!(max_results_arg(&json!({"max_results": -3})).is_err());
        assert!(max_results_arg(&json!({"max_results": "ten"})).is_err());
    }

    #[test]
    fn test_contain_names_the_tool() {
        let outcome = contain(
            "list_projects",
            Err(JiraMcpError::network("connection refused")),
        );
        assert!(outcome.is_error);
        assert_eq!(
            outcome.text,
            "Error executing list_projects: Network error: connection refused"
        );
    }
}
