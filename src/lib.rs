#![deny(missing_docs)]

//! Core library for the Pulpd document-ingestion server.

/// HTTP routing and multipart upload handlers.
pub mod api;
/// Text splitting strategies and chunk statistics.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and HTTP providers.
pub mod embedding;
/// User-feedback store with similarity matching and aggregates.
pub mod feedback;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// PDF parser backend registry.
pub mod parser;
/// Document processing pipeline: parse, chunk, embed, store.
pub mod processing;
/// Qdrant vector store integration.
pub mod qdrant;
