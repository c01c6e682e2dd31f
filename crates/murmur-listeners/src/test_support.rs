//! Counting fake collaborators for listener state-machine tests.

use async_trait::async_trait;
use murmur_core::{
    DocumentSource, Embedder, Generator, MentionsFeed, Notification, Publisher, SourceDocument,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Document source with a settable current document and per-id failures.
pub struct MockSource {
    document: Mutex<SourceDocument>,
    failing_ids: Mutex<HashSet<String>>,
    fetches: AtomicUsize,
}

impl MockSource {
    pub fn new(revision_marker: &str, title: &str, content: &str) -> Self {
        Self {
            document: Mutex::new(SourceDocument {
                revision_marker: revision_marker.to_string(),
                title: title.to_string(),
                content: content.to_string(),
            }),
            failing_ids: Mutex::new(HashSet::new()),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_document(&self, revision_marker: &str, title: &str, content: &str) {
        *self.document.lock().unwrap() = SourceDocument {
            revision_marker: revision_marker.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        };
    }

    pub fn fail_for(&self, source_id: &str) {
        self.failing_ids.lock().unwrap().insert(source_id.to_string());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn fetch(&self, source_id: &str) -> murmur_core::Result<SourceDocument> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing_ids.lock().unwrap().contains(source_id) {
            return Err(murmur_core::Error::SourceUnavailable(format!(
                "mock outage for {}",
                source_id
            )));
        }
        Ok(self.document.lock().unwrap().clone())
    }
}

/// Deterministic embedder that counts calls.
pub struct MockEmbedder {
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> murmur_core::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![text.chars().count() as f32, 1.0, 0.5])
    }
}

/// Generator returning a fixed reply, counting calls.
pub struct MockGenerator {
    calls: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(
        &self,
        _context_fragments: &[String],
        _instruction: &str,
    ) -> murmur_core::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Thanks for the kind words!".to_string())
    }
}

/// Mentions feed returning a settable batch on every poll.
pub struct MockFeed {
    batch: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
    fetches: AtomicUsize,
}

impl MockFeed {
    pub fn new(batch: Vec<Notification>) -> Self {
        Self {
            batch: Mutex::new(batch),
            failing: Mutex::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_batch(&self, batch: Vec<Notification>) {
        *self.batch.lock().unwrap() = batch;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MentionsFeed for MockFeed {
    async fn fetch_notifications(&self) -> murmur_core::Result<Vec<Notification>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.failing.lock().unwrap() {
            return Err(murmur_core::Error::SourceUnavailable(
                "mock feed outage".to_string(),
            ));
        }
        Ok(self.batch.lock().unwrap().clone())
    }
}

/// Publisher that fails a configured number of times before succeeding.
pub struct MockPublisher {
    remaining_failures: Mutex<usize>,
    published: Mutex<Vec<(String, Option<String>)>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures: usize) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<(String, Option<String>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, text: &str, in_reply_to: Option<&str>) -> murmur_core::Result<String> {
        let mut remaining = self.remaining_failures.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(murmur_core::Error::PublishFailed(
                "mock instance outage".to_string(),
            ));
        }

        let mut published = self.published.lock().unwrap();
        published.push((text.to_string(), in_reply_to.map(str::to_string)));
        Ok(format!("post-{}", published.len()))
    }
}
