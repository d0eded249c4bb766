//! Core data types and error definitions for the processing pipeline.

use crate::{
    chunking::{ChunkingError, SplitStrategy},
    embedding::EmbeddingClientError,
    parser::{DEFAULT_PARSER, ParseError, ParserKind},
    qdrant::QdrantError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default target chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;
/// Default trailing characters repeated at the start of the next chunk.
pub const DEFAULT_CHUNK_OVERLAP: usize = 500;

/// Errors emitted by the document processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Parser backend failed to decode an uploaded file.
    #[error("Failed to parse document: {0}")]
    Parse(#[from] ParseError),
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce a vector for the input text.
    #[error("Failed to generate embedding: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Qdrant interaction failed during ingestion.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] QdrantError),
}

/// One uploaded file as received from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub filename: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Caller-supplied document-level metadata merged into every stored chunk.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Document title.
    #[serde(default)]
    pub title: Option<String>,
    /// Document author.
    #[serde(default)]
    pub author: Option<String>,
    /// Document type classification.
    #[serde(default, alias = "docType")]
    pub doc_type: Option<String>,
    /// Genre classification.
    #[serde(default)]
    pub genre: Option<String>,
    /// Topic classification.
    #[serde(default)]
    pub topic: Option<String>,
    /// Difficulty classification.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Filterable tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Source type classification.
    #[serde(default, alias = "sourceType")]
    pub source_type: Option<String>,
    /// Short document summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Source locator (file name or URL).
    #[serde(default)]
    pub source: Option<String>,
}

/// Parameters controlling parsing and splitting for one request.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    /// Splitting strategy.
    pub splitter: SplitStrategy,
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Trailing characters repeated at the start of the next chunk.
    pub chunk_overlap: usize,
    /// Parser backend decoding the uploaded files.
    pub parser: ParserKind,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            splitter: SplitStrategy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            parser: DEFAULT_PARSER,
        }
    }
}

/// Summary of a completed upload produced by the ingestion stage.
///
/// The operation never fails atomically: some chunks or files may have been
/// dropped along the way, and the counters make that visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOutcome {
    /// Number of documents attempted.
    pub documents_count: usize,
    /// Number of chunks successfully stored.
    pub chunks_count: usize,
    /// Number of chunks dropped due to embedding or storage failures.
    pub chunks_failed: usize,
}
