use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_ingested: AtomicU64,
    chunks_stored: AtomicU64,
    chunks_failed: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed document with the chunks it stored and dropped.
    pub fn record_document(&self, chunks_stored: u64, chunks_failed: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_stored.fetch_add(chunks_stored, Ordering::Relaxed);
        self.chunks_failed.fetch_add(chunks_failed, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_stored: self.chunks_stored.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents processed since startup.
    pub documents_ingested: u64,
    /// Total chunk count stored across all documents.
    pub chunks_stored: u64,
    /// Chunks dropped due to embedding or storage failures.
    pub chunks_failed: u64,
}
