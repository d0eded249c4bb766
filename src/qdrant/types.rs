//! Shared types used by the Qdrant client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Qdrant.
#[derive(Debug, Error)]
pub enum QdrantError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Qdrant URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Qdrant responded with an unexpected status code.
    #[error("Unexpected Qdrant response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Qdrant.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// The persisted unit: one chunk with its merged document metadata.
///
/// One record per chunk; no parent document record exists. Chunks are the
/// unit of storage and retrieval.
#[derive(Debug, Clone, Default)]
pub struct ChunkRecord {
    /// Chunk body.
    pub content: String,
    /// Source document title.
    pub title: Option<String>,
    /// Source document author.
    pub author: Option<String>,
    /// Document type classification.
    pub doc_type: Option<String>,
    /// Genre classification.
    pub genre: Option<String>,
    /// Topic classification.
    pub topic: Option<String>,
    /// Difficulty classification.
    pub difficulty: Option<String>,
    /// Filterable tags.
    pub tags: Vec<String>,
    /// Source type classification.
    pub source_type: Option<String>,
    /// Short document summary.
    pub summary: Option<String>,
    /// Source locator (file name or URL).
    pub source: Option<String>,
    /// Position of this chunk within its document.
    pub chunk_id: usize,
    /// Number of chunks produced for the document.
    pub total_chunks: usize,
    /// Parser backend that decoded the document.
    pub parser: String,
    /// Time the backend spent decoding, in milliseconds.
    pub parse_time_ms: u64,
    /// Page count reported by the backend.
    pub pages: usize,
}

/// Scored payload returned by Qdrant queries.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// Identifier assigned to the vector.
    pub id: String,
    /// Similarity score computed by Qdrant.
    pub score: f32,
    /// Optional payload associated with the vector.
    pub payload: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) result: QueryResponseResult,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryResponseResult {
    Points(Vec<QueryPoint>),
    Object {
        #[serde(default)]
        points: Vec<QueryPoint>,
        #[serde(default)]
        _count: Option<usize>,
    },
}

#[derive(Deserialize)]
pub(crate) struct QueryPoint {
    pub(crate) id: Value,
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) payload: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct ScrollResponse {
    pub(crate) result: ScrollResult,
}

#[derive(Deserialize)]
pub(crate) struct ScrollResult {
    #[serde(default)]
    pub(crate) points: Vec<ScrollPoint>,
    #[serde(default)]
    pub(crate) next_page_offset: Option<Value>,
}

#[derive(Deserialize)]
pub(crate) struct ScrollPoint {
    #[serde(default)]
    pub(crate) payload: Option<Map<String, Value>>,
}
