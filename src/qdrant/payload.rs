//! Helpers for constructing and hashing Qdrant payloads.

use crate::qdrant::types::ChunkRecord;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
///
/// Document-level fields live at the top level so they stay filterable;
/// parser provenance and chunk position ride in the nested `metadata` object.
pub(crate) fn build_chunk_payload(record: &ChunkRecord, timestamp_rfc3339: &str) -> Value {
    let mut payload = Map::new();
    payload.insert("content".into(), Value::String(record.content.clone()));
    insert_optional(&mut payload, "title", &record.title);
    insert_optional(&mut payload, "author", &record.author);
    insert_optional(&mut payload, "doc_type", &record.doc_type);
    insert_optional(&mut payload, "genre", &record.genre);
    insert_optional(&mut payload, "topic", &record.topic);
    insert_optional(&mut payload, "difficulty", &record.difficulty);
    if !record.tags.is_empty() {
        payload.insert(
            "tags".into(),
            Value::Array(record.tags.iter().cloned().map(Value::String).collect()),
        );
    }
    insert_optional(&mut payload, "source_type", &record.source_type);
    insert_optional(&mut payload, "summary", &record.summary);
    insert_optional(&mut payload, "source", &record.source);
    payload.insert("chunk_id".into(), Value::from(record.chunk_id));
    payload.insert("total_chunks".into(), Value::from(record.total_chunks));
    payload.insert(
        "metadata".into(),
        json!({
            "parser": record.parser,
            "parse_time_ms": record.parse_time_ms,
            "pages": record.pages,
            "chunk_index": record.chunk_id,
            "chunk_length": record.content.chars().count(),
            "content_hash": compute_content_hash(&record.content),
            "ingested_at": timestamp_rfc3339,
        }),
    );

    Value::Object(payload)
}

fn insert_optional(payload: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value.as_ref().filter(|value| !value.trim().is_empty()) {
        payload.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current timestamp formatted for payload storage.
pub fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Construct an identifier suitable for Qdrant points.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}
