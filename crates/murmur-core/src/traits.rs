//! Collaborator capabilities the core is driven through.
//!
//! Each external dependency is a single-purpose trait so listeners and the
//! sync pipeline can be exercised with in-process fakes. Production
//! implementations live in `murmur-llm`, `murmur-sources`, and `murmur-db`.

use crate::error::Result;
use crate::types::{ArtifactId, DraftKind, DraftLinkage, Notification, SourceDocument};
use async_trait::async_trait;

/// Turns text into a fixed-length embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Fails with `Error::EmbeddingUnavailable` on transport or auth failure.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Fetches the current state of one external document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, source_id: &str) -> Result<SourceDocument>;
}

/// Fetches recent inbound events from the social feed.
#[async_trait]
pub trait MentionsFeed: Send + Sync {
    /// Events are returned in feed order; callers must not reorder them.
    async fn fetch_notifications(&self) -> Result<Vec<Notification>>;
}

/// Turns retrieved context into generated text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, context_fragments: &[String], instruction: &str) -> Result<String>;
}

/// Publishes text to the outside world.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the external post id. Fails with `Error::PublishFailed`.
    async fn publish(&self, text: &str, in_reply_to: Option<&str>) -> Result<String>;
}

/// Persists generated text for human review.
pub trait DraftSink: Send + Sync {
    fn save_draft(&self, text: &str, kind: DraftKind, linkage: DraftLinkage)
        -> Result<ArtifactId>;
}
