//! HTTP surface for the ingestion backend.
//!
//! A compact Axum router with two groups of endpoints:
//!
//! - `POST /preview` – Parse and chunk uploaded PDFs, returning statistics
//!   without writing anything.
//! - `POST /upload` – Parse, chunk, embed, and store uploaded PDFs.
//! - `GET /metrics` – Observe ingestion counters.
//! - `POST /feedback` – Record a user feedback entry.
//! - `POST /feedback/search` – Find feedback similar to a query.
//! - `GET /feedback/summary` – Aggregate feedback counts and ratings.
//! - `GET /feedback/summary/daily` – The same aggregates per calendar day.
//!
//! Both upload endpoints accept `multipart/form-data` with repeated `files`
//! fields plus optional `splitterType`, `chunkSize`, `chunkOverlap`, and
//! `pdfParser` controls; `/upload` additionally requires a JSON `metadata`
//! field. Snake_case aliases of the control fields are accepted too.

use crate::chunking::{ChunkStats, SplitStrategy};
use crate::config::get_config;
use crate::feedback::{FeedbackApi, FeedbackCategory, FeedbackError, FeedbackMatch, NewFeedback};
use crate::metrics::MetricsSnapshot;
use crate::parser::ParserKind;
use crate::processing::{
    ChunkingOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DocumentMetadata, ProcessingApi,
    ProcessingError, UploadedFile,
};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Maximum accepted request body size. PDFs run large.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared handles behind every route.
#[derive(Clone)]
pub struct AppState {
    /// Document processing pipeline.
    pub processing: Arc<dyn ProcessingApi>,
    /// Feedback store.
    pub feedback: Arc<dyn FeedbackApi>,
}

/// Build the HTTP router exposing the ingestion and feedback API surface.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/preview", post(preview_documents))
        .route("/upload", post(upload_documents))
        .route("/metrics", get(get_metrics))
        .route("/feedback", post(record_feedback))
        .route("/feedback/search", post(search_feedback))
        .route("/feedback/summary", get(feedback_summary))
        .route("/feedback/summary/daily", get(feedback_daily_summary))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Success response for the `POST /preview` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewResponse {
    success: bool,
    chunk_stats: ChunkStats,
}

/// Parse and chunk the uploaded files without persisting anything.
async fn preview_documents(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;
    let chunk_stats = state.processing.preview(form.files, form.options).await?;
    tracing::info!(chunks = chunk_stats.total_chunks, "Preview request completed");
    Ok(Json(PreviewResponse {
        success: true,
        chunk_stats,
    }))
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    documents_count: usize,
    chunks_count: usize,
    message: String,
}

/// Parse, chunk, embed, and store the uploaded files.
async fn upload_documents(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;
    let metadata = form
        .metadata
        .ok_or_else(|| ApiError::bad_request("metadata field is required"))?;

    let outcome = state
        .processing
        .ingest(form.files, metadata, form.options)
        .await?;
    let message = if outcome.chunks_failed > 0 {
        format!(
            "stored {} of {} chunks",
            outcome.chunks_count,
            outcome.chunks_count + outcome.chunks_failed
        )
    } else {
        format!(
            "stored {} chunks from {} documents",
            outcome.chunks_count, outcome.documents_count
        )
    };
    tracing::info!(
        documents = outcome.documents_count,
        chunks = outcome.chunks_count,
        failed = outcome.chunks_failed,
        "Upload request completed"
    );
    Ok(Json(UploadResponse {
        success: true,
        documents_count: outcome.documents_count,
        chunks_count: outcome.chunks_count,
        message,
    }))
}

/// Return the current ingestion counters.
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.processing.metrics_snapshot())
}

/// Request body for `POST /feedback`.
#[derive(Deserialize)]
struct FeedbackRequest {
    query: String,
    response: String,
    /// Category name; resolved against the registered category list.
    category: String,
    #[serde(default)]
    rating: Option<u8>,
    #[serde(default)]
    comment: Option<String>,
}

/// Record one feedback entry.
async fn record_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let category = FeedbackCategory::from_name(&request.category)?;
    let id = state
        .feedback
        .record(NewFeedback {
            query: request.query,
            response: request.response,
            category,
            rating: request.rating,
            comment: request.comment,
        })
        .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

/// Request body for `POST /feedback/search`.
#[derive(Deserialize)]
struct FeedbackSearchRequest {
    query: String,
    #[serde(default)]
    threshold: Option<f32>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Response body for `POST /feedback/search`.
#[derive(Serialize)]
struct FeedbackSearchResponse {
    success: bool,
    results: Vec<FeedbackMatch>,
}

/// Find stored feedback similar to the supplied query.
async fn search_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackSearchRequest>,
) -> Result<Json<FeedbackSearchResponse>, ApiError> {
    let results = state
        .feedback
        .find_similar(request.query, request.threshold, request.limit)
        .await?;
    Ok(Json(FeedbackSearchResponse {
        success: true,
        results,
    }))
}

/// Aggregate feedback counts and ratings.
async fn feedback_summary(
    State(state): State<AppState>,
) -> Result<Json<crate::feedback::FeedbackSummary>, ApiError> {
    Ok(Json(state.feedback.summary().await?))
}

/// Aggregate feedback per calendar day, newest first.
async fn feedback_daily_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<crate::feedback::DailyFeedbackSummary>>, ApiError> {
    Ok(Json(state.feedback.daily_summary().await?))
}

/// Decoded multipart upload form shared by `/preview` and `/upload`.
struct UploadForm {
    files: Vec<UploadedFile>,
    metadata: Option<DocumentMetadata>,
    options: ChunkingOptions,
}

/// Read and validate the multipart form for the upload endpoints.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut files = Vec::new();
    let mut metadata = None;
    let mut splitter = SplitStrategy::default();
    let mut chunk_size = DEFAULT_CHUNK_SIZE;
    let mut chunk_overlap = DEFAULT_CHUNK_OVERLAP;
    let mut parser = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let filename = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .unwrap_or("upload.pdf")
                    .to_string();
                let bytes = field.bytes().await.map_err(|err| {
                    ApiError::bad_request(format!("failed to read file '{filename}': {err}"))
                })?;
                files.push(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            "metadata" => {
                let raw = read_text_field(field, &name).await?;
                let parsed: DocumentMetadata = serde_json::from_str(&raw).map_err(|err| {
                    ApiError::bad_request(format!("invalid metadata JSON: {err}"))
                })?;
                metadata = Some(parsed);
            }
            "splitterType" | "splitter_type" => {
                let raw = read_text_field(field, &name).await?;
                splitter = SplitStrategy::from_name(raw.trim())
                    .map_err(|err| ApiError::bad_request(err.to_string()))?;
            }
            "chunkSize" | "chunk_size" => {
                chunk_size = read_usize_field(field, &name).await?;
            }
            "chunkOverlap" | "chunk_overlap" => {
                chunk_overlap = read_usize_field(field, &name).await?;
            }
            "pdfParser" | "pdf_parser" => {
                let raw = read_text_field(field, &name).await?;
                parser = Some(
                    ParserKind::from_name(raw.trim())
                        .map_err(|err| ApiError::bad_request(err.to_string()))?,
                );
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("no files provided"));
    }
    crate::chunking::validate_split_bounds(chunk_size, chunk_overlap)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    let parser = match parser {
        Some(parser) => parser,
        None => ParserKind::from_name(&get_config().pdf_parser)
            .map_err(|err| ApiError::bad_request(err.to_string()))?,
    };

    Ok(UploadForm {
        files,
        metadata,
        options: ChunkingOptions {
            splitter,
            chunk_size,
            chunk_overlap,
            parser,
        },
    })
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|err| ApiError::bad_request(format!("failed to read field '{name}': {err}")))
}

async fn read_usize_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<usize, ApiError> {
    let raw = read_text_field(field, name).await?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid {name} '{}'", raw.trim())))
}

/// Error type mapping pipeline failures onto HTTP statuses.
enum ApiError {
    /// Caller mistake; reported verbatim with a 400.
    BadRequest(String),
    /// Backend failure; logged in full, reported generically with a 500.
    Internal(String),
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ProcessingError> for ApiError {
    fn from(error: ProcessingError) -> Self {
        match error {
            ProcessingError::Parse(_) | ProcessingError::Chunking(_) => {
                ApiError::BadRequest(error.to_string())
            }
            ProcessingError::Embedding(_) | ProcessingError::Qdrant(_) => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl From<FeedbackError> for ApiError {
    fn from(error: FeedbackError) -> Self {
        match error {
            FeedbackError::InvalidCategory { .. } | FeedbackError::InvalidRating { .. } => {
                ApiError::BadRequest(error.to_string())
            }
            FeedbackError::Embedding(_) | FeedbackError::Qdrant(_) => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppState, create_router};
    use crate::chunking::{Chunk, ChunkStats, chunk_stats};
    use crate::config::{CONFIG, Config, EmbeddingProvider};
    use crate::feedback::{
        DailyFeedbackSummary, FeedbackApi, FeedbackError, FeedbackMatch, FeedbackSummary,
        NewFeedback,
    };
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        ChunkingOptions, DocumentMetadata, IngestOutcome, ProcessingApi, ProcessingError,
        UploadedFile,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Once};
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pulpd-test-boundary";

    fn ensure_test_config() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = CONFIG.set(Config {
                qdrant_url: "http://127.0.0.1:6333".into(),
                qdrant_collection_name: "documents".into(),
                qdrant_api_key: None,
                feedback_collection_name: "user_feedback".into(),
                embedding_provider: EmbeddingProvider::Stub,
                embedding_model: "test-model".into(),
                embedding_dimension: 8,
                openai_api_key: None,
                openai_base_url: None,
                ollama_url: None,
                pdf_parser: "pdf-extract".into(),
                allow_stub_parser: true,
                server_port: None,
            });
        });
    }

    #[derive(Clone, Debug)]
    struct PreviewCall {
        files: Vec<String>,
        options: ChunkingOptions,
    }

    struct StubProcessing {
        preview_calls: Mutex<Vec<PreviewCall>>,
        ingest_outcome: IngestOutcome,
        ingest_metadata: Mutex<Option<DocumentMetadata>>,
    }

    impl StubProcessing {
        fn new(ingest_outcome: IngestOutcome) -> Self {
            Self {
                preview_calls: Mutex::new(Vec::new()),
                ingest_outcome,
                ingest_metadata: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ProcessingApi for StubProcessing {
        async fn preview(
            &self,
            files: Vec<UploadedFile>,
            options: ChunkingOptions,
        ) -> Result<ChunkStats, ProcessingError> {
            self.preview_calls.lock().await.push(PreviewCall {
                files: files.iter().map(|file| file.filename.clone()).collect(),
                options,
            });
            let chunks = vec![
                Chunk {
                    index: 0,
                    text: "alpha".into(),
                    length: 5,
                },
                Chunk {
                    index: 1,
                    text: "beta".into(),
                    length: 4,
                },
            ];
            Ok(chunk_stats(chunks, Vec::new()))
        }

        async fn ingest(
            &self,
            _files: Vec<UploadedFile>,
            metadata: DocumentMetadata,
            _options: ChunkingOptions,
        ) -> Result<IngestOutcome, ProcessingError> {
            *self.ingest_metadata.lock().await = Some(metadata);
            Ok(self.ingest_outcome)
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_ingested: 3,
                chunks_stored: 12,
                chunks_failed: 1,
            }
        }
    }

    struct StubFeedback;

    #[async_trait]
    impl FeedbackApi for StubFeedback {
        async fn record(&self, _feedback: NewFeedback) -> Result<String, FeedbackError> {
            Ok("feedback-id-1".to_string())
        }

        async fn find_similar(
            &self,
            _query_text: String,
            threshold: Option<f32>,
            _limit: Option<usize>,
        ) -> Result<Vec<FeedbackMatch>, FeedbackError> {
            Ok(vec![FeedbackMatch {
                id: "match-1".into(),
                score: threshold.unwrap_or(0.8) + 0.1,
                query: "q".into(),
                response: "r".into(),
                category: "helpful".into(),
                rating: Some(5),
                comment: "solid".into(),
                created_at: "2026-08-29T10:00:00Z".into(),
            }])
        }

        async fn summary(&self) -> Result<FeedbackSummary, FeedbackError> {
            Ok(FeedbackSummary {
                total: 2,
                average_rating: Some(4.5),
                categories: BTreeMap::from([("helpful".to_string(), 2)]),
            })
        }

        async fn daily_summary(&self) -> Result<Vec<DailyFeedbackSummary>, FeedbackError> {
            Ok(Vec::new())
        }
    }

    fn test_app(ingest_outcome: IngestOutcome) -> (axum::Router, Arc<StubProcessing>) {
        ensure_test_config();
        let processing = Arc::new(StubProcessing::new(ingest_outcome));
        let app = create_router(AppState {
            processing: processing.clone(),
            feedback: Arc::new(StubFeedback),
        });
        (app, processing)
    }

    fn multipart_part(name: &str, filename: Option<&str>, value: &str) -> String {
        match filename {
            Some(filename) => format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n{value}\r\n"
            ),
            None => format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ),
        }
    }

    fn multipart_request(uri: &str, parts: &[String]) -> Request<Body> {
        let mut body = parts.concat();
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn preview_returns_camel_case_chunk_stats() {
        let (app, processing) = test_app(IngestOutcome::default());

        let parts = [
            multipart_part("files", Some("report.pdf"), "raw pdf bytes"),
            multipart_part("splitterType", None, "markdown"),
            multipart_part("chunkSize", None, "1200"),
            multipart_part("chunkOverlap", None, "150"),
            multipart_part("pdfParser", None, "lopdf"),
        ];
        let response = app
            .oneshot(multipart_request("/preview", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["chunkStats"]["totalChunks"], 2);
        assert_eq!(json["chunkStats"]["avgChunkLength"], 5);
        assert_eq!(json["chunkStats"]["firstChunk"]["text"], "alpha");

        let calls = processing.preview_calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].files, vec!["report.pdf".to_string()]);
        assert_eq!(calls[0].options.chunk_size, 1200);
        assert_eq!(calls[0].options.chunk_overlap, 150);
        assert_eq!(calls[0].options.splitter.name(), "markdown");
        assert_eq!(calls[0].options.parser.name(), "lopdf");
    }

    #[tokio::test]
    async fn preview_without_files_is_rejected() {
        let (app, _) = test_app(IngestOutcome::default());

        let parts = [multipart_part("chunkSize", None, "1000")];
        let response = app
            .oneshot(multipart_request("/preview", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "no files provided");
    }

    #[tokio::test]
    async fn unknown_parser_name_lists_valid_backends() {
        let (app, _) = test_app(IngestOutcome::default());

        let parts = [
            multipart_part("files", Some("a.pdf"), "bytes"),
            multipart_part("pdfParser", None, "ghostscript"),
        ];
        let response = app
            .oneshot(multipart_request("/preview", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let message = json["error"].as_str().expect("error string");
        assert!(message.contains("ghostscript"));
        assert!(message.contains("pdf-extract"));
        assert!(message.contains("lopdf"));
        assert!(message.contains("stub"));
    }

    #[tokio::test]
    async fn unknown_splitter_name_is_rejected() {
        let (app, _) = test_app(IngestOutcome::default());

        let parts = [
            multipart_part("files", Some("a.pdf"), "bytes"),
            multipart_part("splitterType", None, "semantic"),
        ];
        let response = app
            .oneshot(multipart_request("/preview", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().expect("error string").contains("recursive"));
    }

    #[tokio::test]
    async fn upload_requires_metadata() {
        let (app, _) = test_app(IngestOutcome::default());

        let parts = [multipart_part("files", Some("a.pdf"), "bytes")];
        let response = app
            .oneshot(multipart_request("/upload", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "metadata field is required");
    }

    #[tokio::test]
    async fn upload_rejects_overlap_not_smaller_than_chunk_size() {
        let (app, processing) = test_app(IngestOutcome::default());

        let parts = [
            multipart_part("files", Some("a.pdf"), "bytes"),
            multipart_part("metadata", None, "{}"),
            multipart_part("chunkSize", None, "100"),
            multipart_part("chunkOverlap", None, "100"),
        ];
        let response = app
            .oneshot(multipart_request("/upload", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let message = json["error"].as_str().expect("error string");
        assert!(message.contains("overlap"));
        assert!(processing.ingest_metadata.lock().await.is_none());
    }

    #[tokio::test]
    async fn upload_reports_partial_failures_in_message() {
        let (app, processing) = test_app(IngestOutcome {
            documents_count: 1,
            chunks_count: 9,
            chunks_failed: 1,
        });

        let metadata = json!({
            "title": "Annual Report",
            "docType": "report",
            "tags": ["finance"]
        });
        let parts = [
            multipart_part("files", Some("report.pdf"), "bytes"),
            multipart_part("metadata", None, &metadata.to_string()),
        ];
        let response = app
            .oneshot(multipart_request("/upload", &parts))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["documentsCount"], 1);
        assert_eq!(json["chunksCount"], 9);
        assert_eq!(json["message"], "stored 9 of 10 chunks");

        let metadata = processing.ingest_metadata.lock().await;
        let metadata = metadata.as_ref().expect("metadata captured");
        assert_eq!(metadata.title.as_deref(), Some("Annual Report"));
        assert_eq!(metadata.doc_type.as_deref(), Some("report"));
        assert_eq!(metadata.tags.as_ref(), Some(&vec!["finance".to_string()]));
    }

    #[tokio::test]
    async fn metrics_route_exposes_counters() {
        let (app, _) = test_app(IngestOutcome::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["documents_ingested"], 3);
        assert_eq!(json["chunks_stored"], 12);
        assert_eq!(json["chunks_failed"], 1);
    }

    #[tokio::test]
    async fn feedback_route_records_and_returns_id() {
        let (app, _) = test_app(IngestOutcome::default());

        let payload = json!({
            "query": "how do I file taxes",
            "response": "Use the e-filing portal.",
            "category": "helpful",
            "rating": 5,
            "comment": "thanks"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/feedback")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["id"], "feedback-id-1");
    }

    #[tokio::test]
    async fn feedback_with_unknown_category_is_rejected() {
        let (app, _) = test_app(IngestOutcome::default());

        let payload = json!({
            "query": "q",
            "response": "r",
            "category": "glowing"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/feedback")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        let message = json["error"].as_str().expect("error string");
        assert!(message.contains("glowing"));
        assert!(message.contains("not_helpful"));
    }

    #[tokio::test]
    async fn feedback_search_returns_matches() {
        let (app, _) = test_app(IngestOutcome::default());

        let payload = json!({ "query": "tax filing", "threshold": 0.85 });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/feedback/search")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["results"][0]["category"], "helpful");
        assert_eq!(json["results"][0]["createdAt"], "2026-08-29T10:00:00Z");
    }

    #[tokio::test]
    async fn feedback_summary_route_serializes_camel_case() {
        let (app, _) = test_app(IngestOutcome::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/feedback/summary")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total"], 2);
        assert_eq!(json["averageRating"], 4.5);
        assert_eq!(json["categories"]["helpful"], 2);
    }
}
