//! Question to JQL resolution
//!
//! Resolves free text against the ordered mapping table. The first mapping
//! with a pattern contained in the question wins; there is no scoring.

use crate::knowledge_store::QueryMapping;

/// Find the first mapping whose pattern occurs in `question`.
///
/// The question is trimmed and lowercased, patterns are lowercased, and both
/// mappings and their patterns are visited in stored order. An empty pattern
/// is a substring of every question, so it always matches.
pub fn resolve<'a>(question: &str, mappings: &'a [QueryMapping]) -> Option<&'a QueryMapping> {
    let normalized = question.trim().to_lowercase();

    mappings.iter().find(|mapping| {
        mapping
            .question_patterns
            .iter()
            .any(|pattern| normalized.contains(&pattern.to_lowercase()))
    })
}

/// Resolve `question` straight to the JQL of the matching mapping.
pub fn resolve_jql<'a>(question: &str, mappings: &'a [QueryMapping]) -> Option<&'a str> {
    resolve(question, mappings).map(|mapping| mapping.jql_query.as_str())
}
