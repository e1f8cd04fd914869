//! List knowledge queries tool
//!
//! Shows every mapping in the knowledge store so an agent can see which
//! questions `answer_question` understands.

use crate::error::JiraMcpResult;
use crate::knowledge_store::KnowledgeStore;
use crate::tools::{report, ToolOutcome};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Implementation of the list_knowledge_queries tool
pub struct ListKnowledgeQueriesTool {
    store: Arc<dyn KnowledgeStore>,
}

impl ListKnowledgeQueriesTool {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self) -> JiraMcpResult<ToolOutcome> {
        let mappings = self.store.snapshot();
        debug!(
            "Listing {} mappings from {}",
            mappings.len(),
            self.store.source()
        );
        Ok(ToolOutcome::text(report::render_knowledge_queries(&mappings)))
    }
}
