//! Core domain types for Murmur.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for documents.
pub type DocumentId = String;

/// Unique identifier for fragments.
pub type FragmentId = String;

/// Unique identifier for interactions.
pub type InteractionId = String;

/// Unique identifier for draft artifacts.
pub type ArtifactId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Category of a fragment's source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Notion,
    Article,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Notion => "notion",
            SourceType::Article => "article",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "notion" => Some(SourceType::Notion),
            "article" => Some(SourceType::Article),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chunking strategy that produced a fragment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    FixedChars,
    #[default]
    Paragraphs,
    Sentences,
    Hybrid,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::FixedChars => "fixed_chars",
            ChunkStrategy::Paragraphs => "paragraphs",
            ChunkStrategy::Sentences => "sentences",
            ChunkStrategy::Hybrid => "hybrid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed_chars" => Some(ChunkStrategy::FixedChars),
            "paragraphs" => Some(ChunkStrategy::Paragraphs),
            "sentences" => Some(ChunkStrategy::Sentences),
            "hybrid" => Some(ChunkStrategy::Hybrid),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contiguous slice of a source document, embedded for retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub id: FragmentId,
    pub source_id: String,
    pub source_type: SourceType,
    /// Position within the document: starts at 0, strictly increasing,
    /// no gaps for a given (source_id, source_type) pair.
    pub ordinal: i32,
    pub strategy: ChunkStrategy,
    pub content: String,
    /// Embedding vector, absent until embedded.
    pub vector: Option<Vec<f32>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Fragment {
    pub fn new(
        source_id: impl Into<String>,
        source_type: SourceType,
        ordinal: i32,
        strategy: ChunkStrategy,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            source_id: source_id.into(),
            source_type,
            ordinal,
            strategy,
            content: content.into(),
            vector: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// One tracked external page, last-seen in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Opaque external identifier, unique per document.
    pub source_id: String,
    pub title: String,
    pub content: String,
    /// Source-provided opaque marker, compared only for equality.
    pub revision_marker: Option<String>,
    pub strategy: ChunkStrategy,
    pub chunk_size: i64,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        strategy: ChunkStrategy,
        chunk_size: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            source_id: source_id.into(),
            title: title.into(),
            content: content.into(),
            revision_marker: None,
            strategy,
            chunk_size,
            last_synced_at: now,
            created_at: now,
        }
    }

    pub fn with_revision_marker(mut self, marker: impl Into<String>) -> Self {
        self.revision_marker = Some(marker.into());
        self
    }
}

/// Kind of an inbound social event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Mention,
    Reply,
    Comment,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Mention => "mention",
            InteractionKind::Reply => "reply",
            InteractionKind::Comment => "comment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mention" => Some(InteractionKind::Mention),
            "reply" => Some(InteractionKind::Reply),
            "comment" => Some(InteractionKind::Comment),
            _ => None,
        }
    }
}

impl std::fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One inbound social event, deduplicated by `external_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub external_id: String,
    pub kind: InteractionKind,
    pub author: String,
    pub content: String,
    /// Back-reference to the post being replied to. Lookup only.
    pub in_reply_to: Option<String>,
    pub responded: bool,
    pub response_artifact_id: Option<ArtifactId>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Interaction {
    pub fn new(
        external_id: impl Into<String>,
        kind: InteractionKind,
        author: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            external_id: external_id.into(),
            kind,
            author: author.into(),
            content: content.into(),
            in_reply_to: None,
            responded: false,
            response_artifact_id: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    pub fn with_in_reply_to(mut self, status_id: impl Into<String>) -> Self {
        self.in_reply_to = Some(status_id.into());
        self
    }
}

/// Kind of a generated draft artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftKind {
    Post,
    Reply,
}

impl DraftKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftKind::Post => "post",
            DraftKind::Reply => "reply",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "post" => Some(DraftKind::Post),
            "reply" => Some(DraftKind::Reply),
            _ => None,
        }
    }
}

impl std::fmt::Display for DraftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Review status of a draft artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Draft,
    Posted,
    Discarded,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Posted => "posted",
            DraftStatus::Discarded => "discarded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(DraftStatus::Draft),
            "posted" => Some(DraftStatus::Posted),
            "discarded" => Some(DraftStatus::Discarded),
            _ => None,
        }
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance of a draft: the change or interaction that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftLinkage {
    Document { source_id: String },
    Interaction { external_id: String },
}

impl DraftLinkage {
    pub fn document(source_id: impl Into<String>) -> Self {
        DraftLinkage::Document {
            source_id: source_id.into(),
        }
    }

    pub fn interaction(external_id: impl Into<String>) -> Self {
        DraftLinkage::Interaction {
            external_id: external_id.into(),
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            DraftLinkage::Document { source_id } => format!("document:{}", source_id),
            DraftLinkage::Interaction { external_id } => format!("interaction:{}", external_id),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let (prefix, rest) = s.split_once(':')?;
        match prefix {
            "document" => Some(DraftLinkage::document(rest)),
            "interaction" => Some(DraftLinkage::interaction(rest)),
            _ => None,
        }
    }
}

/// A generated post or reply awaiting review or already published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: ArtifactId,
    pub content: String,
    pub kind: DraftKind,
    pub status: DraftStatus,
    pub linkage: Option<DraftLinkage>,
    pub external_post_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Draft {
    pub fn new(content: impl Into<String>, kind: DraftKind) -> Self {
        Self {
            id: new_id(),
            content: content.into(),
            kind,
            status: DraftStatus::Draft,
            linkage: None,
            external_post_id: None,
            created_at: Utc::now(),
            posted_at: None,
        }
    }

    pub fn with_linkage(mut self, linkage: DraftLinkage) -> Self {
        self.linkage = Some(linkage);
        self
    }
}

/// Snapshot of a document as reported by its external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub revision_marker: String,
    pub title: String,
    pub content: String,
}

/// One event from the mentions feed, in feed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub external_id: String,
    pub kind: InteractionKind,
    pub author: String,
    pub content: String,
    pub in_reply_to: Option<String>,
}

/// Statistics about the knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_documents: i64,
    pub total_fragments: i64,
    pub embedded_fragments: i64,
    pub total_interactions: i64,
    pub unresponded_interactions: i64,
    pub drafts_by_status: std::collections::HashMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_roundtrip() {
        for strategy in [
            ChunkStrategy::FixedChars,
            ChunkStrategy::Paragraphs,
            ChunkStrategy::Sentences,
            ChunkStrategy::Hybrid,
        ] {
            assert_eq!(ChunkStrategy::from_str(strategy.as_str()), Some(strategy));
        }
        assert_eq!(ChunkStrategy::from_str("semantic"), None);
    }

    #[test]
    fn test_fragment_creation() {
        let fragment = Fragment::new(
            "page-1",
            SourceType::Notion,
            0,
            ChunkStrategy::Paragraphs,
            "Some content",
        )
        .with_vector(vec![0.1, 0.2]);

        assert_eq!(fragment.source_id, "page-1");
        assert_eq!(fragment.ordinal, 0);
        assert!(fragment.vector.is_some());
        assert!(!fragment.id.is_empty());
    }

    #[test]
    fn test_draft_linkage_roundtrip() {
        let linkage = DraftLinkage::document("page-1");
        assert_eq!(linkage.as_string(), "document:page-1");
        assert_eq!(DraftLinkage::parse("document:page-1"), Some(linkage));

        let linkage = DraftLinkage::interaction("109_1");
        assert_eq!(DraftLinkage::parse(&linkage.as_string()), Some(linkage));
        assert_eq!(DraftLinkage::parse("nonsense"), None);
    }

    #[test]
    fn test_interaction_defaults() {
        let interaction = Interaction::new("42", InteractionKind::Mention, "@ada", "hello");
        assert!(!interaction.responded);
        assert!(interaction.response_artifact_id.is_none());
        assert!(interaction.processed_at.is_none());
    }
}
