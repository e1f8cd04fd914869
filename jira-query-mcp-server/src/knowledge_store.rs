//! Knowledge store for question-to-JQL mappings
//!
//! The store holds an ordered table of [`QueryMapping`] records loaded from a
//! YAML document of the form:
//!
//! ```yaml
//! queries:
//!   - question_patterns: ["open bugs", "active bugs"]
//!     jql_query: "type = Bug AND status != Done"
//!     description: "Find open bugs"
//!     examples: ["Show me open bugs"]
//! ```
//!
//! Readers work on a snapshot (`Arc<Vec<QueryMapping>>`); a reload builds the
//! new table first and swaps it in whole, so a failed reload leaves the
//! previous mappings in place.

use crate::error::{JiraMcpError, JiraMcpResult};
use crate::matcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

/// A mapping from question patterns to a canonical JQL query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMapping {
    /// Substrings that select this mapping, checked in order
    pub question_patterns: Vec<String>,

    /// JQL executed when a pattern matches
    pub jql_query: String,

    /// Human-readable description used in listings and suggestions
    pub description: String,

    /// Example questions, for documentation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
}

/// Top-level shape of a knowledge store document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default)]
    pub queries: Vec<QueryMapping>,
}

/// Abstract knowledge store
///
/// Backends only provide loading and snapshots; lookups and listings are
/// shared so every backend resolves questions identically.
pub trait KnowledgeStore: Send + Sync + fmt::Debug {
    /// Reload from the backing source, returning the number of mappings.
    /// On error the previously loaded mappings stay in place.
    fn reload(&self) -> JiraMcpResult<usize>;

    /// Current mapping table
    fn snapshot(&self) -> Arc<Vec<QueryMapping>>;

    /// Human-readable location of the backing source
    fn source(&self) -> String;

    /// Copy of every mapping, in store order
    fn list_available_queries(&self) -> Vec<QueryMapping> {
        self.snapshot().as_ref().clone()
    }

    /// JQL for the first mapping matching `question`
    fn get_jql_for_question(&self, question: &str) -> Option<String> {
        let mappings = self.snapshot();
        matcher::resolve_jql(question, &mappings).map(str::to_string)
    }

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

/// Read the mapping table from a YAML document.
///
/// A missing file, an empty document or a document without a `queries`
/// list yields no mappings. Syntax errors and records missing required
/// fields are load errors naming the file.
pub fn load_mappings(path: &Path) -> JiraMcpResult<Vec<QueryMapping>> {
    if !path.exists() {
        debug!("Knowledge store {} does not exist", path.display());
        return Ok(Vec::new());
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| JiraMcpError::store_load(path, e.to_string()))?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| JiraMcpError::store_load(path, e.to_string()))?;

    let queries = match document.get("queries") {
        Some(queries) if !queries.is_null() => queries,
        _ => {
            warn!(
                "Knowledge store {} has no 'queries' section",
                path.display()
            );
            return Ok(Vec::new());
        }
    };

    let records = queries
        .as_sequence()
        .ok_or_else(|| JiraMcpError::store_load(path, "'queries' must be a list"))?;

    let mappings = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            serde_yaml::from_value::<QueryMapping>(record.clone()).map_err(|e| {
                JiraMcpError::store_load(path, format!("query #{}: {}", index + 1, e))
            })
        })
        .collect::<JiraMcpResult<Vec<_>>>()?;

    for (index, mapping) in mappings.iter().enumerate() {
        if mapping.question_patterns.iter().any(|p| p.trim().is_empty()) {
            warn!(
                "Knowledge store {} query #{} ('{}') has a blank pattern that matches every question",
                path.display(),
                index + 1,
                mapping.description
            );
        }
    }

    Ok(mappings)
}

/// YAML-file backed knowledge store
#[derive(Debug)]
pub struct YamlKnowledgeStore {
    file_path: PathBuf,
    mappings: RwLock<Arc<Vec<QueryMapping>>>,
}

impl YamlKnowledgeStore {
    /// Create the store and load it immediately
    pub fn new(file_path: impl Into<PathBuf>) -> JiraMcpResult<Self> {
        let store = Self {
            file_path: file_path.into(),
            mappings: RwLock::new(Arc::new(Vec::new())),
        };
        store.reload()?;
        Ok(store)
    }
}

impl KnowledgeStore for YamlKnowledgeStore {
    #[instrument(skip(self), fields(path = %self.file_path.display()))]
    fn reload(&self) -> JiraMcpResult<usize> {
        let mappings = load_mappings(&self.file_path)?;
        let count = mappings.len();

        // The table is only ever replaced whole, so a poisoned lock still
        // guards a consistent value.
        let mut guard = self
            .mappings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(mappings);

        info!("Knowledge store loaded with {} query mappings", count);
        Ok(count)
    }

    fn snapshot(&self) -> Arc<Vec<QueryMapping>> {
        let guard = self
            .mappings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    fn source(&self) -> String {
        self.file_path.display().to_string()
    }
}

/// Supported knowledge store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Yaml,
}

impl FromStr for StoreKind {
    type Err = JiraMcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yaml" | "yml" => Ok(StoreKind::Yaml),
            other => Err(JiraMcpError::config(format!(
                "Unsupported knowledge store type: {}",
                other
            ))),
        }
    }
}

/// Create a knowledge store of the given kind
pub fn create_store(kind: StoreKind, path: impl Into<PathBuf>) -> JiraMcpResult<Arc<dyn KnowledgeStore>> {
    match kind {
        StoreKind::Yaml => Ok(Arc::new(YamlKnowledgeStore::new(path)?)),
    }
}
