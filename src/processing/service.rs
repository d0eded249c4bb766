//! Processing service coordinating parsing, chunking, embedding, and Qdrant writes.

use crate::{
    chunking::{Chunk, ChunkStats, FileProvenance, chunk_stats, split_text, validate_split_bounds},
    config::get_config,
    embedding::EmbeddingClient,
    metrics::{IngestMetrics, MetricsSnapshot},
    parser::{ParseResult, ParserKind, parse_with_fallback},
    processing::types::{
        ChunkingOptions, DocumentMetadata, IngestOutcome, ProcessingError, UploadedFile,
    },
    qdrant::{ChunkRecord, QdrantService},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Coordinates the full ingestion pipeline: parsing, splitting, embedding, and
/// Qdrant writes.
///
/// The service owns long-lived handles to the embedding client, the Qdrant
/// transport, and the metrics registry. Construct it once near process start
/// and share it through an `Arc`.
pub struct ProcessingService {
    embedding_client: Arc<dyn EmbeddingClient>,
    qdrant_service: QdrantService,
    collection: String,
    allow_stub_parser: bool,
    metrics: Arc<IngestMetrics>,
}

/// Abstraction over the processing pipeline used by the HTTP surface.
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Parse and split the uploaded files, returning statistics only.
    ///
    /// The dry-run path: nothing is embedded or persisted.
    async fn preview(
        &self,
        files: Vec<UploadedFile>,
        options: ChunkingOptions,
    ) -> Result<ChunkStats, ProcessingError>;

    /// Parse, split, embed, and store every uploaded file.
    async fn ingest(
        &self,
        files: Vec<UploadedFile>,
        metadata: DocumentMetadata,
        options: ChunkingOptions,
    ) -> Result<IngestOutcome, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build a new processing service from the loaded configuration.
    pub async fn new(
        embedding_client: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, ProcessingError> {
        let config = get_config();
        let qdrant_service = QdrantService::new()?;
        let vector_size = config.embedding_dimension as u64;
        tracing::debug!(
            collection = %config.qdrant_collection_name,
            vector_size,
            "Ensuring chunk collection"
        );
        qdrant_service
            .create_collection_if_not_exists(&config.qdrant_collection_name, vector_size)
            .await?;

        Ok(Self {
            embedding_client,
            qdrant_service,
            collection: config.qdrant_collection_name.clone(),
            allow_stub_parser: config.allow_stub_parser,
            metrics: Arc::new(IngestMetrics::new()),
        })
    }

    /// Build a service around explicit components, bypassing the environment.
    pub fn with_parts(
        embedding_client: Arc<dyn EmbeddingClient>,
        qdrant_service: QdrantService,
        collection: impl Into<String>,
        allow_stub_parser: bool,
    ) -> Self {
        Self {
            embedding_client,
            qdrant_service,
            collection: collection.into(),
            allow_stub_parser,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Parse and split the uploaded files, returning aggregate statistics.
    pub async fn preview(
        &self,
        files: Vec<UploadedFile>,
        options: ChunkingOptions,
    ) -> Result<ChunkStats, ProcessingError> {
        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut provenance = Vec::new();

        for file in files {
            let parsed = self.parse_file(&file, options.parser)?;
            let chunks = split_text(
                &parsed.text,
                options.splitter,
                options.chunk_size,
                options.chunk_overlap,
            )?;
            tracing::debug!(
                file = %file.filename,
                parser = parsed.parser_used,
                chunks = chunks.len(),
                "Previewed file"
            );
            provenance.push(FileProvenance {
                filename: file.filename,
                parser_used: parsed.parser_used.to_string(),
                parse_time_ms: parsed.parse_time_ms,
                pages: parsed.metadata.pages,
            });
            let offset = all_chunks.len();
            all_chunks.extend(chunks.into_iter().map(|mut chunk| {
                chunk.index += offset;
                chunk
            }));
        }

        Ok(chunk_stats(all_chunks, provenance))
    }

    /// Parse, split, embed, and store every uploaded file.
    ///
    /// Strictly sequential: one embedding round trip and one storage write per
    /// chunk, awaited in order. A chunk failure drops that chunk only; a file
    /// failure drops that file only. There is no rollback and no retry.
    pub async fn ingest(
        &self,
        files: Vec<UploadedFile>,
        metadata: DocumentMetadata,
        options: ChunkingOptions,
    ) -> Result<IngestOutcome, ProcessingError> {
        // A bad chunk budget is a request mistake, not a file-level failure;
        // reject it before the skip loop can absorb it.
        validate_split_bounds(options.chunk_size, options.chunk_overlap)?;

        let mut outcome = IngestOutcome {
            documents_count: files.len(),
            ..Default::default()
        };

        for file in files {
            let parsed = match self.parse_file(&file, options.parser) {
                Ok(parsed) => parsed,
                Err(error) => {
                    tracing::warn!(file = %file.filename, error = %error, "Skipping unparseable file");
                    continue;
                }
            };
            let chunks = match split_text(
                &parsed.text,
                options.splitter,
                options.chunk_size,
                options.chunk_overlap,
            ) {
                Ok(chunks) => chunks,
                Err(error) => {
                    tracing::warn!(file = %file.filename, error = %error, "Skipping unsplittable file");
                    continue;
                }
            };

            let total_chunks = chunks.len();
            let mut stored = 0usize;
            let mut failed = 0usize;

            for chunk in chunks {
                match self
                    .store_chunk(&file, &parsed, &metadata, chunk, total_chunks)
                    .await
                {
                    Ok(()) => stored += 1,
                    Err(error) => {
                        failed += 1;
                        tracing::warn!(
                            file = %file.filename,
                            error = %error,
                            "Dropping chunk after pipeline failure"
                        );
                    }
                }
            }

            self.metrics.record_document(stored as u64, failed as u64);
            tracing::info!(
                file = %file.filename,
                parser = parsed.parser_used,
                chunks = total_chunks,
                stored,
                failed,
                "Document ingested"
            );
            outcome.chunks_count += stored;
            outcome.chunks_failed += failed;
        }

        Ok(outcome)
    }

    async fn store_chunk(
        &self,
        file: &UploadedFile,
        parsed: &ParseResult,
        metadata: &DocumentMetadata,
        chunk: Chunk,
        total_chunks: usize,
    ) -> Result<(), ProcessingError> {
        let enhanced = context_enhanced_text(metadata, &chunk.text);
        let vector = self.embedding_client.embed(&enhanced).await?;

        let record = ChunkRecord {
            content: chunk.text,
            title: metadata.title.clone().or_else(|| parsed.metadata.title.clone()),
            author: metadata.author.clone().or_else(|| parsed.metadata.author.clone()),
            doc_type: metadata.doc_type.clone(),
            genre: metadata.genre.clone(),
            topic: metadata.topic.clone(),
            difficulty: metadata.difficulty.clone(),
            tags: metadata.tags.clone().unwrap_or_default(),
            source_type: metadata.source_type.clone(),
            summary: metadata.summary.clone(),
            source: metadata.source.clone().or_else(|| Some(file.filename.clone())),
            chunk_id: chunk.index,
            total_chunks,
            parser: parsed.parser_used.to_string(),
            parse_time_ms: parsed.parse_time_ms,
            pages: parsed.metadata.pages,
        };
        self.qdrant_service
            .upsert_chunk(&self.collection, &record, vector)
            .await?;
        Ok(())
    }

    fn parse_file(
        &self,
        file: &UploadedFile,
        parser: ParserKind,
    ) -> Result<ParseResult, ProcessingError> {
        let parsed = parse_with_fallback(&file.bytes, parser, self.allow_stub_parser)?;
        Ok(parsed)
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Build the context-enhanced string embedded for a chunk.
///
/// Prepends select document-level fields so similarity search leans toward
/// source-aware matches. The raw chunk text is what gets stored; this string
/// is only what gets embedded.
pub fn context_enhanced_text(metadata: &DocumentMetadata, chunk_text: &str) -> String {
    let mut enhanced = String::new();
    if let Some(title) = metadata.title.as_ref().filter(|value| !value.trim().is_empty()) {
        enhanced.push_str(&format!("Title: {title}\n"));
    }
    if let Some(author) = metadata.author.as_ref().filter(|value| !value.trim().is_empty()) {
        enhanced.push_str(&format!("Author: {author}\n"));
    }
    if let Some(topic) = metadata.topic.as_ref().filter(|value| !value.trim().is_empty()) {
        enhanced.push_str(&format!("Topic: {topic}\n"));
    }
    if !enhanced.is_empty() {
        enhanced.push('\n');
    }
    enhanced.push_str(chunk_text);
    enhanced
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn preview(
        &self,
        files: Vec<UploadedFile>,
        options: ChunkingOptions,
    ) -> Result<ChunkStats, ProcessingError> {
        ProcessingService::preview(self, files, options).await
    }

    async fn ingest(
        &self,
        files: Vec<UploadedFile>,
        metadata: DocumentMetadata,
        options: ChunkingOptions,
    ) -> Result<IngestOutcome, ProcessingError> {
        ProcessingService::ingest(self, files, metadata, options).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::SplitStrategy;
    use crate::embedding::EmbeddingClientError;
    use crate::parser::ParserKind;
    use httpmock::prelude::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedding client that fails on a single, predetermined call.
    struct ScriptedClient {
        calls: AtomicUsize,
        fail_on_call: usize,
    }

    #[async_trait]
    impl EmbeddingClient for ScriptedClient {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on_call {
                return Err(EmbeddingClientError::GenerationFailed(format!(
                    "scripted failure on call {call}"
                )));
            }
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    /// Embedding client that records every input it is asked to embed.
    struct RecordingClient {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmbeddingClient for RecordingClient {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
            self.inputs.lock().unwrap().push(text.to_string());
            Ok(vec![0.5, 0.5])
        }
    }

    fn service_with(
        client: Arc<dyn EmbeddingClient>,
        qdrant_url: &str,
    ) -> ProcessingService {
        let qdrant = QdrantService::with_connection(qdrant_url, None).unwrap();
        ProcessingService::with_parts(client, qdrant, "docs", true)
    }

    fn stub_options(chunk_size: usize, chunk_overlap: usize) -> ChunkingOptions {
        ChunkingOptions {
            splitter: SplitStrategy::Character,
            chunk_size,
            chunk_overlap,
            parser: ParserKind::Stub,
        }
    }

    /// Ten paragraphs of ninety characters each split into exactly ten chunks
    /// at a window of one hundred characters with no overlap.
    fn ten_paragraph_text() -> String {
        let paragraph = format!("{}\n\n", "x".repeat(90));
        paragraph.repeat(10)
    }

    #[tokio::test]
    async fn failed_chunk_is_dropped_without_sinking_the_document() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/docs/points");
                then.status(200).json_body(serde_json::json!({ "status": "ok" }));
            })
            .await;

        let client = Arc::new(ScriptedClient {
            calls: AtomicUsize::new(0),
            fail_on_call: 4,
        });
        let service = service_with(client, &server.base_url());

        let files = vec![UploadedFile {
            filename: "report.pdf".to_string(),
            bytes: ten_paragraph_text().into_bytes(),
        }];
        let outcome = service
            .ingest(files, DocumentMetadata::default(), stub_options(100, 0))
            .await
            .unwrap();

        assert_eq!(outcome.documents_count, 1);
        assert_eq!(outcome.chunks_count, 9);
        assert_eq!(outcome.chunks_failed, 1);
        assert_eq!(upsert.hits(), 9);

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.documents_ingested, 1);
        assert_eq!(snapshot.chunks_stored, 9);
        assert_eq!(snapshot.chunks_failed, 1);
    }

    #[tokio::test]
    async fn unparseable_file_is_skipped_during_ingest() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/docs/points");
                then.status(200).json_body(serde_json::json!({ "status": "ok" }));
            })
            .await;

        let client = Arc::new(RecordingClient {
            inputs: Mutex::new(Vec::new()),
        });
        let qdrant = QdrantService::with_connection(&server.base_url(), None).unwrap();
        // Stub fallback disabled, so garbage bytes fail both real backends.
        let service = ProcessingService::with_parts(client, qdrant, "docs", false);

        let files = vec![UploadedFile {
            filename: "broken.pdf".to_string(),
            bytes: vec![0xde, 0xad, 0xbe, 0xef],
        }];
        let options = ChunkingOptions {
            parser: ParserKind::PdfExtract,
            ..ChunkingOptions::default()
        };
        let outcome = service
            .ingest(files, DocumentMetadata::default(), options)
            .await
            .unwrap();

        assert_eq!(outcome.documents_count, 1);
        assert_eq!(outcome.chunks_count, 0);
        assert_eq!(outcome.chunks_failed, 0);
        assert_eq!(upsert.hits(), 0);
        assert_eq!(service.metrics_snapshot().documents_ingested, 0);
    }

    #[tokio::test]
    async fn ingest_embeds_context_enhanced_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/docs/points");
                then.status(200).json_body(serde_json::json!({ "status": "ok" }));
            })
            .await;

        let client = Arc::new(RecordingClient {
            inputs: Mutex::new(Vec::new()),
        });
        let service = service_with(client.clone(), &server.base_url());

        let metadata = DocumentMetadata {
            title: Some("Field Guide".to_string()),
            topic: Some("mycology".to_string()),
            ..DocumentMetadata::default()
        };
        let files = vec![UploadedFile {
            filename: "guide.pdf".to_string(),
            bytes: b"Chanterelles favor mossy conifer stands.".to_vec(),
        }];
        service
            .ingest(files, metadata, stub_options(5000, 500))
            .await
            .unwrap();

        let inputs = client.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        assert!(inputs[0].starts_with("Title: Field Guide\nTopic: mycology\n\n"));
        assert!(inputs[0].ends_with("Chanterelles favor mossy conifer stands."));
    }

    #[tokio::test]
    async fn preview_reindexes_chunks_across_files() {
        let client = Arc::new(RecordingClient {
            inputs: Mutex::new(Vec::new()),
        });
        // Preview never touches the network.
        let service = service_with(client, "http://127.0.0.1:6333");

        let files = vec![
            UploadedFile {
                filename: "a.pdf".to_string(),
                bytes: ten_paragraph_text().into_bytes(),
            },
            UploadedFile {
                filename: "b.pdf".to_string(),
                bytes: b"short follow-up".to_vec(),
            },
        ];
        let stats = service.preview(files, stub_options(100, 0)).await.unwrap();

        assert_eq!(stats.total_chunks, 11);
        assert_eq!(stats.files.len(), 2);
        assert_eq!(stats.files[0].parser_used, "stub");
        let indexes: Vec<usize> = stats.chunks.iter().map(|chunk| chunk.index).collect();
        assert_eq!(indexes, (0..11).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn ingest_rejects_overlap_not_smaller_than_chunk_size() {
        let client = Arc::new(RecordingClient {
            inputs: Mutex::new(Vec::new()),
        });
        // Rejected before any parsing or network traffic.
        let service = service_with(client.clone(), "http://127.0.0.1:6333");

        let files = vec![UploadedFile {
            filename: "report.pdf".to_string(),
            bytes: ten_paragraph_text().into_bytes(),
        }];
        let error = service
            .ingest(files, DocumentMetadata::default(), stub_options(100, 100))
            .await
            .unwrap_err();

        assert!(matches!(error, ProcessingError::Chunking(_)));
        assert!(client.inputs.lock().unwrap().is_empty());
        assert_eq!(service.metrics_snapshot().documents_ingested, 0);
    }

    #[tokio::test]
    async fn preview_propagates_chunking_errors() {
        let client = Arc::new(RecordingClient {
            inputs: Mutex::new(Vec::new()),
        });
        let service = service_with(client, "http://127.0.0.1:6333");

        let files = vec![UploadedFile {
            filename: "a.pdf".to_string(),
            bytes: b"some text".to_vec(),
        }];
        let error = service
            .preview(files, stub_options(100, 100))
            .await
            .unwrap_err();
        assert!(matches!(error, ProcessingError::Chunking(_)));
    }

    #[test]
    fn context_enhancement_skips_blank_fields() {
        let metadata = DocumentMetadata {
            title: Some("  ".to_string()),
            author: Some("Ada".to_string()),
            ..DocumentMetadata::default()
        };
        let enhanced = context_enhanced_text(&metadata, "body");
        assert_eq!(enhanced, "Author: Ada\n\nbody");
    }

    #[test]
    fn context_enhancement_without_metadata_is_identity() {
        let enhanced = context_enhanced_text(&DocumentMetadata::default(), "body");
        assert_eq!(enhanced, "body");
    }
}
