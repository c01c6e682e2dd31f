//! Retrieval engine: query embedding + similarity scan.

use crate::error::{RagError, RagResult};
use murmur_core::{Embedder, SourceType};
use murmur_db::{Database, ScoredFragment};
use std::sync::Arc;
use tracing::debug;

/// Answers similarity queries over the fragment store.
#[derive(Clone)]
pub struct RetrievalEngine {
    db: Database,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    pub fn new(db: Database, embedder: Arc<dyn Embedder>) -> Self {
        Self { db, embedder }
    }

    /// Retrieve the `top_k` fragments most similar to a query, optionally
    /// filtered by source type. An empty store yields an empty result.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        source_type: Option<SourceType>,
    ) -> RagResult<Vec<ScoredFragment>> {
        if top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }

        let query_vector = self.embedder.embed(query).await?;
        let results = self.db.similar_fragments(&query_vector, top_k, source_type)?;

        debug!("Retrieved {} fragments for query ({} chars)", results.len(), query.len());
        Ok(results)
    }

    /// Extract the context texts for the generation step, best match first.
    pub fn build_context(results: &[ScoredFragment]) -> Vec<String> {
        results.iter().map(|r| r.fragment.content.clone()).collect()
    }
}
