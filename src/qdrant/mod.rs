//! Qdrant vector store integration.

pub mod client;
pub mod payload;
pub mod types;

pub use client::QdrantService;
pub use payload::{compute_content_hash, current_timestamp_rfc3339};
pub use types::{ChunkRecord, QdrantError, ScoredPoint};
