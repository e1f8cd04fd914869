//! Plain-text rendering of tool results

use crate::jira_client::{IssueInfo, JqlSearchResult, ProjectInfo};
use crate::knowledge_store::QueryMapping;
use std::fmt::Write;

/// Descriptions offered when a question matches nothing
pub const SUGGESTION_LIMIT: usize = 5;

/// Render a JQL search: the `header` lines, the totals, then one block per issue.
///
/// `Total Results` is the match count JIRA reports for the query, which can
/// exceed the issues returned; a `Showing: first N` line follows when it does.
pub fn render_search(header: &[(&str, &str)], result: &JqlSearchResult) -> String {
    let mut output = String::new();

    for (label, value) in header {
        let _ = writeln!(output, "{}: {}", label, value);
    }
    let _ = writeln!(output, "Total Results: {}", result.total);
    if result.issues.len() < result.total {
        let _ = writeln!(output, "Showing: first {}", result.issues.len());
    }
    output.push('\n');

    if result.issues.is_empty() {
        output.push_str("No issues found matching the query.\n");
    } else {
        for issue in &result.issues {
            output.push_str(&render_issue(issue));
        }
    }

    output
}

/// Render a single issue block
pub fn render_issue(issue: &IssueInfo) -> String {
    let mut block = format!("🎫 {}: {}\n", issue.key, issue.summary);
    let _ = writeln!(block, "   Status: {}", issue.status);
    let _ = writeln!(block, "   Type: {}", issue.issue_type);
    let _ = writeln!(block, "   Project: {}", issue.project_key);
    if let Some(assignee) = &issue.assignee {
        let _ = writeln!(block, "   Assignee: {}", assignee);
    }
    if let Some(priority) = &issue.priority {
        let _ = writeln!(block, "   Priority: {}", priority);
    }
    let _ = writeln!(block, "   Created: {}", issue.created);
    block.push('\n');
    block
}

/// Message for a question no mapping matched, with the first few
/// descriptions in store order as suggestions
pub fn render_no_match(question: &str, mappings: &[QueryMapping]) -> String {
    let suggestions = if mappings.is_empty() {
        "- (the knowledge store is empty)".to_string()
    } else {
        mappings
            .iter()
            .take(SUGGESTION_LIMIT)
            .map(|mapping| format!("- {}", mapping.description))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Could not find a JQL query for your question: '{}'\n\n\
         Available query types:\n{}\n\n\
         Try rephrasing your question or use the 'execute_jql' tool directly.",
        question, suggestions
    )
}

/// Render the project listing
pub fn render_projects(projects: &[ProjectInfo]) -> String {
    let mut output = String::from("Available JIRA Projects:\n\n");

    if projects.is_empty() {
        output.push_str("No projects are visible to the configured account.\n");
        return output;
    }

    for project in projects {
        let _ = writeln!(output, "🗂️  {}: {}", project.key, project.name);
        if let Some(description) = &project.description {
            let _ = writeln!(output, "   Description: {}", description);
        }
        if let Some(lead) = &project.lead {
            let _ = writeln!(output, "   Lead: {}", lead);
        }
        output.push('\n');
    }

    output
}

/// Render every knowledge store mapping
pub fn render_knowledge_queries(mappings: &[QueryMapping]) -> String {
    if mappings.is_empty() {
        return "No query mappings found in knowledge store. \
                Please check your knowledge store configuration."
            .to_string();
    }

    let mut output = String::from("Available Query Patterns:\n\n");
    for mapping in mappings {
        let _ = writeln!(output, "📋 {}", mapping.description);
        let _ = writeln!(output, "   JQL: {}", mapping.jql_query);
        let _ = writeln!(
            output,
            "   Patterns: {}",
            mapping.question_patterns.join(", ")
        );
        if let Some(examples) = mapping.examples.as_ref().filter(|e| !e.is_empty()) {
            let _ = writeln!(output, "   Examples: {}", examples.join(", "));
        }
        output.push('\n');
    }

    output
}
