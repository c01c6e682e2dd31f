//! Document listener: polls the document source and drives the sync
//! pipeline on change.

use crate::error::ListenerResult;
use murmur_core::{
    DocumentSource, DraftKind, DraftLinkage, DraftSink, Generator, SourceType,
};
use murmur_db::Database;
use murmur_rag::{ChunkConfig, RetrievalEngine, SyncOutcome, SyncPipeline};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Instruction handed to the generator when a document changes.
const DRAFT_INSTRUCTION: &str =
    "Write one short social media post announcing what is new. \
     Do not include hashtags.";

/// Configuration for a document listener instance.
#[derive(Debug, Clone)]
pub struct DocumentListenerConfig {
    /// External ids of the documents to monitor, processed in order.
    pub source_ids: Vec<String>,
    pub source_type: SourceType,
    pub poll_interval: Duration,
    /// Generate a draft post after each successful sync.
    pub generate_drafts: bool,
    /// Retrieval query seeding the generated draft.
    pub draft_query: String,
    pub top_k: usize,
    pub chunking: ChunkConfig,
}

/// What happened to one document within a tick.
enum DocumentOutcome {
    Unchanged,
    Synced { drafted: bool },
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTickSummary {
    pub synced: usize,
    pub unchanged: usize,
    pub drafted: usize,
    pub errors: usize,
}

/// Polls monitored documents and syncs them on change.
pub struct DocumentListener {
    source: Arc<dyn DocumentSource>,
    pipeline: SyncPipeline,
    engine: RetrievalEngine,
    generator: Arc<dyn Generator>,
    drafts: Arc<dyn DraftSink>,
    db: Database,
    config: DocumentListenerConfig,
}

impl DocumentListener {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn DocumentSource>,
        pipeline: SyncPipeline,
        engine: RetrievalEngine,
        generator: Arc<dyn Generator>,
        drafts: Arc<dyn DraftSink>,
        db: Database,
        config: DocumentListenerConfig,
    ) -> Self {
        Self {
            source,
            pipeline,
            engine,
            generator,
            drafts,
            db,
            config,
        }
    }

    /// Run one poll cycle over all monitored documents, sequentially and
    /// in configured order. A failure on one document never prevents the
    /// next from being processed.
    pub async fn tick(&self) -> DocumentTickSummary {
        let mut summary = DocumentTickSummary::default();

        for source_id in &self.config.source_ids {
            match self.process_document(source_id).await {
                Ok(DocumentOutcome::Unchanged) => summary.unchanged += 1,
                Ok(DocumentOutcome::Synced { drafted }) => {
                    summary.synced += 1;
                    if drafted {
                        summary.drafted += 1;
                    }
                }
                Err(e) => {
                    summary.errors += 1;
                    if e.is_integrity_violation() {
                        tracing::error!("Integrity violation syncing {}: {}", source_id, e);
                    } else {
                        warn!("Failed to process document {}: {}", source_id, e);
                    }
                }
            }
        }

        summary
    }

    /// Fetch one document, compare revision markers, and sync on change.
    async fn process_document(&self, source_id: &str) -> ListenerResult<DocumentOutcome> {
        let fetched = self.source.fetch(source_id).await?;

        // Opaque marker, equality only. A missing stored document always
        // counts as changed.
        let stored = self.db.get_document(source_id)?;
        if let Some(doc) = &stored {
            if doc.revision_marker.as_deref() == Some(fetched.revision_marker.as_str()) {
                debug!("Document {} revision unchanged", source_id);
                return Ok(DocumentOutcome::Unchanged);
            }
        }

        info!("Document {} changed, syncing", source_id);

        let outcome = self
            .pipeline
            .sync(
                source_id,
                self.config.source_type,
                &fetched.title,
                &fetched.content,
                Some(&fetched.revision_marker),
                &self.config.chunking,
            )
            .await?;

        // A marker change over identical content (clock-only edit) syncs
        // to Unchanged; there is nothing new worth drafting about.
        let SyncOutcome::Synced { fragment_count, .. } = outcome else {
            return Ok(DocumentOutcome::Unchanged);
        };
        debug!("Synced {} fragments for {}", fragment_count, source_id);

        if !self.config.generate_drafts {
            return Ok(DocumentOutcome::Synced { drafted: false });
        }

        let results = self
            .engine
            .retrieve(&self.config.draft_query, self.config.top_k, Some(self.config.source_type))
            .await?;
        let context = RetrievalEngine::build_context(&results);

        let text = self.generator.generate(&context, DRAFT_INSTRUCTION).await?;
        let artifact_id =
            self.drafts
                .save_draft(&text, DraftKind::Post, DraftLinkage::document(source_id))?;

        info!("Drafted post {} from document {}", artifact_id, source_id);
        Ok(DocumentOutcome::Synced { drafted: true })
    }

    /// Poll on the configured interval until the shutdown signal flips or
    /// the iteration bound is reached. The signal is checked at tick
    /// boundaries only, never mid-item.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>, max_iterations: Option<u64>) {
        info!(
            "Starting document listener for {} document(s), interval {:?}",
            self.config.source_ids.len(),
            self.config.poll_interval
        );

        let mut iteration = 0u64;

        loop {
            if *shutdown.borrow() {
                info!("Document listener stopping on shutdown signal");
                break;
            }

            iteration += 1;
            debug!("Document poll #{}", iteration);

            let summary = self.tick().await;
            info!(
                "Document poll #{}: {} synced, {} unchanged, {} drafted, {} errors",
                iteration, summary.synced, summary.unchanged, summary.drafted, summary.errors
            );

            if let Some(max) = max_iterations {
                if iteration >= max {
                    info!("Document listener reached max iterations ({})", max);
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use murmur_db::DraftStore;

    fn listener(
        db: &Database,
        source: Arc<MockSource>,
        embedder: Arc<MockEmbedder>,
        generator: Arc<MockGenerator>,
    ) -> DocumentListener {
        DocumentListener::new(
            source,
            SyncPipeline::new(db.clone(), embedder.clone()),
            RetrievalEngine::new(db.clone(), embedder),
            generator,
            Arc::new(DraftStore::new(db.clone())),
            db.clone(),
            DocumentListenerConfig {
                source_ids: vec!["page-1".to_string()],
                source_type: SourceType::Notion,
                poll_interval: Duration::from_millis(1),
                generate_drafts: true,
                draft_query: "What is new?".to_string(),
                top_k: 3,
                chunking: ChunkConfig::default(),
            },
        )
    }

    #[tokio::test]
    async fn test_first_tick_syncs_and_drafts() {
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(MockSource::new("rev-1", "Guide", "Fresh bread.\n\nDaily."));
        let embedder = Arc::new(MockEmbedder::new());
        let generator = Arc::new(MockGenerator::new());

        let listener = listener(&db, source, embedder, generator.clone());
        let summary = listener.tick().await;

        assert_eq!(summary.synced, 1);
        assert_eq!(summary.drafted, 1);
        assert_eq!(summary.errors, 0);
        assert_eq!(generator.count(), 1);

        let drafts = db.list_drafts(None, 10).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(
            drafts[0].linkage,
            Some(DraftLinkage::document("page-1"))
        );
    }

    #[tokio::test]
    async fn test_unchanged_revision_skips_sync_and_generation() {
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(MockSource::new("rev-1", "Guide", "Fresh bread."));
        let embedder = Arc::new(MockEmbedder::new());
        let generator = Arc::new(MockGenerator::new());

        let listener = listener(&db, source.clone(), embedder.clone(), generator.clone());

        let first = listener.tick().await;
        assert_eq!(first.synced, 1);
        let embeds_after_first = embedder.count();
        let generates_after_first = generator.count();

        // Same revision marker on the second tick
        let second = listener.tick().await;
        assert_eq!(second, DocumentTickSummary { unchanged: 1, ..Default::default() });
        assert_eq!(embedder.count(), embeds_after_first);
        assert_eq!(generator.count(), generates_after_first);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_revision_change_triggers_resync() {
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(MockSource::new("rev-1", "Guide", "Original text."));
        let embedder = Arc::new(MockEmbedder::new());
        let generator = Arc::new(MockGenerator::new());

        let listener = listener(&db, source.clone(), embedder, generator.clone());
        listener.tick().await;

        source.set_document("rev-2", "Guide", "Edited text.");
        let summary = listener.tick().await;

        assert_eq!(summary.synced, 1);
        assert_eq!(generator.count(), 2);

        let doc = db.get_document("page-1").unwrap().unwrap();
        assert_eq!(doc.content, "Edited text.");
        assert_eq!(doc.revision_marker.as_deref(), Some("rev-2"));
    }

    #[tokio::test]
    async fn test_clock_only_edit_syncs_quietly() {
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(MockSource::new("rev-1", "Guide", "Same text."));
        let embedder = Arc::new(MockEmbedder::new());
        let generator = Arc::new(MockGenerator::new());

        let listener = listener(&db, source.clone(), embedder.clone(), generator.clone());
        listener.tick().await;
        let embeds = embedder.count();

        // Marker changes, content does not: treated as a change, but the
        // pipeline's no-op rule absorbs it and no draft is generated
        source.set_document("rev-2", "Guide", "Same text.");
        let summary = listener.tick().await;

        assert_eq!(summary.unchanged, 1);
        assert_eq!(embedder.count(), embeds);
        assert_eq!(generator.count(), 1);

        // Marker was still recorded, so tick 3 is an ordinary no-change poll
        let doc = db.get_document("page-1").unwrap().unwrap();
        assert_eq!(doc.revision_marker.as_deref(), Some("rev-2"));
    }

    #[tokio::test]
    async fn test_one_failing_document_does_not_block_others() {
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(MockSource::new("rev-1", "Guide", "Good content."));
        source.fail_for("page-bad");
        let embedder = Arc::new(MockEmbedder::new());
        let generator = Arc::new(MockGenerator::new());

        let listener = DocumentListener::new(
            source,
            SyncPipeline::new(db.clone(), embedder.clone()),
            RetrievalEngine::new(db.clone(), embedder),
            generator,
            Arc::new(DraftStore::new(db.clone())),
            db.clone(),
            DocumentListenerConfig {
                source_ids: vec!["page-bad".to_string(), "page-1".to_string()],
                source_type: SourceType::Notion,
                poll_interval: Duration::from_millis(1),
                generate_drafts: false,
                draft_query: "What is new?".to_string(),
                top_k: 3,
                chunking: ChunkConfig::default(),
            },
        );

        let summary = listener.tick().await;
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.synced, 1);
        assert!(db.get_document("page-1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_run_honors_max_iterations_and_shutdown() {
        let db = Database::open_in_memory().unwrap();
        let source = Arc::new(MockSource::new("rev-1", "Guide", "Content."));
        let embedder = Arc::new(MockEmbedder::new());
        let generator = Arc::new(MockGenerator::new());

        let listener = listener(&db, source.clone(), embedder, generator);

        let (_tx, rx) = watch::channel(false);
        listener.run(rx, Some(2)).await;
        assert_eq!(source.fetch_count(), 2);

        // A pre-flipped shutdown signal stops before the first tick
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        listener.run(rx, None).await;
        assert_eq!(source.fetch_count(), 2);
    }
}
