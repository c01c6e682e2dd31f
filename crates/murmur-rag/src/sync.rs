//! Sync pipeline: chunk, embed, and atomically replace a document's
//! fragment set.

use crate::chunker::{self, ChunkConfig};
use crate::error::RagResult;
use murmur_core::{Document, DocumentId, Embedder, Fragment, SourceType};
use murmur_db::Database;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a sync call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Content and chunking parameters were identical to the stored
    /// document; nothing was re-embedded or rewritten.
    Unchanged,
    /// The document's fragment set was replaced.
    Synced {
        document_id: DocumentId,
        fragment_count: usize,
    },
}

/// Drives a document's content into the retrieval store.
#[derive(Clone)]
pub struct SyncPipeline {
    db: Database,
    embedder: Arc<dyn Embedder>,
}

impl SyncPipeline {
    pub fn new(db: Database, embedder: Arc<dyn Embedder>) -> Self {
        Self { db, embedder }
    }

    /// Sync one document.
    ///
    /// A no-op when `content` is byte-identical to the stored document and
    /// the chunking parameters are unchanged; this equality check is the
    /// sole dedup rule. Otherwise: chunk, embed every chunk (a single
    /// embedding failure aborts the whole sync, leaving the previous
    /// fragment set intact), then atomically replace the fragment set and
    /// upsert the document row.
    pub async fn sync(
        &self,
        source_id: &str,
        source_type: SourceType,
        title: &str,
        content: &str,
        revision_marker: Option<&str>,
        config: &ChunkConfig,
    ) -> RagResult<SyncOutcome> {
        let existing = self.db.get_document(source_id)?;

        if let Some(stored) = &existing {
            if stored.content == content
                && stored.strategy == config.strategy
                && stored.chunk_size == config.size as i64
            {
                debug!("Document {} unchanged, skipping sync", source_id);
                // A new marker over identical content (a clock-only edit)
                // is still recorded so later polls stop re-detecting it
                if let Some(marker) = revision_marker {
                    if stored.revision_marker.as_deref() != Some(marker) {
                        self.db.update_revision_marker(source_id, marker)?;
                    }
                }
                return Ok(SyncOutcome::Unchanged);
            }
        }

        let texts = chunker::chunk(content, config.strategy, config.size, config.overlap)?;
        debug!("Chunked document {} into {} fragments", source_id, texts.len());

        let mut fragments = Vec::with_capacity(texts.len());
        for (ordinal, text) in texts.iter().enumerate() {
            let vector = self.embedder.embed(text).await?;
            fragments.push(
                Fragment::new(source_id, source_type, ordinal as i32, config.strategy, text.as_str())
                    .with_vector(vector)
                    .with_metadata(serde_json::json!({
                        "strategy": config.strategy.as_str(),
                        "chunk_size": config.size,
                    })),
            );
        }

        // Replace before the document upsert: if the document write fails,
        // the stored content still differs and the next poll re-syncs,
        // rather than no-opping against fragments that were never written.
        let fragment_count = self.db.replace_fragments(source_id, source_type, &fragments)?;

        let mut document = Document::new(source_id, title, content, config.strategy, config.size as i64);
        if let Some(marker) = revision_marker {
            document = document.with_revision_marker(marker);
        }
        let document_id = self.db.upsert_document(&document)?;

        info!(
            "Synced document {} ({} fragments, strategy {})",
            source_id, fragment_count, config.strategy
        );

        Ok(SyncOutcome::Synced {
            document_id,
            fragment_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use murmur_core::ChunkStrategy;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder that counts calls and can fail after a set
    /// number of successes.
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: None,
            }
        }

        fn failing_after(successes: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: Some(successes),
            }
        }

        fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> murmur_core::Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(limit) = self.fail_after {
                if call >= limit {
                    return Err(murmur_core::Error::EmbeddingUnavailable(
                        "mock transport down".to_string(),
                    ));
                }
            }
            Ok(vec![text.chars().count() as f32, 1.0])
        }
    }

    const CONTENT: &str = "Our philosophy.\n\nFresh every day.\n\nCompostable packaging.";

    fn config() -> ChunkConfig {
        ChunkConfig {
            strategy: ChunkStrategy::Paragraphs,
            size: 20,
            overlap: 0,
        }
    }

    #[tokio::test]
    async fn test_sync_creates_document_and_fragments() {
        let db = Database::open_in_memory().unwrap();
        let embedder = Arc::new(CountingEmbedder::new());
        let pipeline = SyncPipeline::new(db.clone(), embedder.clone());

        let outcome = pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, Some("rev-1"), &config())
            .await
            .unwrap();

        let SyncOutcome::Synced { fragment_count, .. } = outcome else {
            panic!("expected a sync");
        };
        assert_eq!(fragment_count, 3);
        assert_eq!(embedder.count(), 3);

        let doc = db.get_document("page-1").unwrap().unwrap();
        assert_eq!(doc.revision_marker.as_deref(), Some("rev-1"));

        let fragments = db.get_fragments("page-1", SourceType::Notion).unwrap();
        let ordinals: Vec<i32> = fragments.iter().map(|f| f.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
        assert!(fragments.iter().all(|f| f.vector.is_some()));
    }

    #[tokio::test]
    async fn test_identical_resync_is_noop() {
        let db = Database::open_in_memory().unwrap();
        let embedder = Arc::new(CountingEmbedder::new());
        let pipeline = SyncPipeline::new(db.clone(), embedder.clone());

        pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, Some("rev-1"), &config())
            .await
            .unwrap();

        let before = db.get_document("page-1").unwrap().unwrap();
        let fragments_before = db.get_fragments("page-1", SourceType::Notion).unwrap();
        let calls_before = embedder.count();

        let outcome = pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, Some("rev-1"), &config())
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(embedder.count(), calls_before);

        let after = db.get_document("page-1").unwrap().unwrap();
        assert_eq!(after.last_synced_at, before.last_synced_at);

        let fragments_after = db.get_fragments("page-1", SourceType::Notion).unwrap();
        let ids_before: Vec<_> = fragments_before.iter().map(|f| f.id.clone()).collect();
        let ids_after: Vec<_> = fragments_after.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids_before, ids_after);
    }

    #[tokio::test]
    async fn test_changed_chunking_params_resync() {
        let db = Database::open_in_memory().unwrap();
        let embedder = Arc::new(CountingEmbedder::new());
        let pipeline = SyncPipeline::new(db.clone(), embedder.clone());

        pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, None, &config())
            .await
            .unwrap();

        // Same content, different size: not a no-op
        let wider = ChunkConfig {
            size: 200,
            ..config()
        };
        let outcome = pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, None, &wider)
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Synced { .. }));
    }

    #[tokio::test]
    async fn test_marker_only_change_updates_marker() {
        let db = Database::open_in_memory().unwrap();
        let embedder = Arc::new(CountingEmbedder::new());
        let pipeline = SyncPipeline::new(db.clone(), embedder.clone());

        pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, Some("rev-1"), &config())
            .await
            .unwrap();
        let calls = embedder.count();

        let outcome = pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, Some("rev-2"), &config())
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::Unchanged);
        assert_eq!(embedder.count(), calls);

        let doc = db.get_document("page-1").unwrap().unwrap();
        assert_eq!(doc.revision_marker.as_deref(), Some("rev-2"));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_whole_sync() {
        let db = Database::open_in_memory().unwrap();
        let pipeline = SyncPipeline::new(db.clone(), Arc::new(CountingEmbedder::new()));

        pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, Some("rev-1"), &config())
            .await
            .unwrap();
        let fragments_before = db.get_fragments("page-1", SourceType::Notion).unwrap();

        // New content, but the embedder dies on the second chunk
        let failing = SyncPipeline::new(db.clone(), Arc::new(CountingEmbedder::failing_after(1)));
        let new_content = "Totally new.\n\nDifferent text.\n\nThird bit.";
        let err = failing
            .sync("page-1", SourceType::Notion, "Guide", new_content, Some("rev-2"), &config())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::RagError::Collaborator(murmur_core::Error::EmbeddingUnavailable(_))
        ));

        // Previous fragment set and document row are intact
        let fragments_after = db.get_fragments("page-1", SourceType::Notion).unwrap();
        let ids_before: Vec<_> = fragments_before.iter().map(|f| f.id.clone()).collect();
        let ids_after: Vec<_> = fragments_after.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids_before, ids_after);

        let doc = db.get_document("page-1").unwrap().unwrap();
        assert_eq!(doc.content, CONTENT);
        assert_eq!(doc.revision_marker.as_deref(), Some("rev-1"));
    }

    #[tokio::test]
    async fn test_empty_content_syncs_empty_set() {
        let db = Database::open_in_memory().unwrap();
        let embedder = Arc::new(CountingEmbedder::new());
        let pipeline = SyncPipeline::new(db.clone(), embedder.clone());

        pipeline
            .sync("page-1", SourceType::Notion, "Guide", CONTENT, None, &config())
            .await
            .unwrap();

        // Page emptied at the source: the fragment set is replaced with nothing
        let outcome = pipeline
            .sync("page-1", SourceType::Notion, "Guide", "", None, &config())
            .await
            .unwrap();

        assert!(matches!(outcome, SyncOutcome::Synced { fragment_count: 0, .. }));
        assert!(db.get_fragments("page-1", SourceType::Notion).unwrap().is_empty());
    }
}
