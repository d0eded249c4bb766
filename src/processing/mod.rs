//! Document processing pipeline: parse, chunk, embed, and store.

mod service;
mod types;

pub use service::{ProcessingApi, ProcessingService, context_enhanced_text};
pub use types::{
    ChunkingOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DocumentMetadata, IngestOutcome,
    ProcessingError, UploadedFile,
};
