//! Murmur RAG - Chunking, embedding, and retrieval.
//!
//! This crate provides:
//! - Content chunking with selectable strategies
//! - The retrieval engine (query embedding + similarity scan)
//! - The sync pipeline that keeps a document's fragment set current

pub mod chunker;
mod engine;
mod error;
mod sync;

pub use chunker::{chunk, chunk_hybrid, ChunkConfig};
pub use engine::RetrievalEngine;
pub use error::{RagError, RagResult};
pub use sync::{SyncOutcome, SyncPipeline};
