//! Qdrant-backed persistence and retrieval for feedback entries.

use crate::{
    config::get_config,
    embedding::EmbeddingClient,
    feedback::types::{
        DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILARITY_THRESHOLD, DailyFeedbackSummary, FeedbackError,
        FeedbackMatch, FeedbackSummary, NewFeedback,
    },
    qdrant::{QdrantService, current_timestamp_rfc3339},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stores feedback entries and answers similarity and aggregate queries.
pub struct FeedbackStore {
    embedding_client: Arc<dyn EmbeddingClient>,
    qdrant_service: QdrantService,
    collection: String,
    vector_size: usize,
}

/// Abstraction over the feedback store used by the HTTP surface.
#[async_trait]
pub trait FeedbackApi: Send + Sync {
    /// Persist one feedback entry and return its point identifier.
    async fn record(&self, feedback: NewFeedback) -> Result<String, FeedbackError>;

    /// Find stored feedback whose query is similar to `query_text`.
    async fn find_similar(
        &self,
        query_text: String,
        threshold: Option<f32>,
        limit: Option<usize>,
    ) -> Result<Vec<FeedbackMatch>, FeedbackError>;

    /// Aggregate counts and ratings across all stored feedback.
    async fn summary(&self) -> Result<FeedbackSummary, FeedbackError>;

    /// Aggregate feedback per calendar day, newest day first.
    async fn daily_summary(&self) -> Result<Vec<DailyFeedbackSummary>, FeedbackError>;
}

impl FeedbackStore {
    /// Build a new feedback store from the loaded configuration.
    pub async fn new(
        embedding_client: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, FeedbackError> {
        let config = get_config();
        let qdrant_service = QdrantService::new()?;
        qdrant_service
            .create_collection_if_not_exists(
                &config.feedback_collection_name,
                config.embedding_dimension as u64,
            )
            .await?;

        Ok(Self {
            embedding_client,
            qdrant_service,
            collection: config.feedback_collection_name.clone(),
            vector_size: config.embedding_dimension,
        })
    }

    /// Build a store around explicit components, bypassing the environment.
    pub fn with_parts(
        embedding_client: Arc<dyn EmbeddingClient>,
        qdrant_service: QdrantService,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Self {
        Self {
            embedding_client,
            qdrant_service,
            collection: collection.into(),
            vector_size,
        }
    }

    /// Persist one feedback entry and return its point identifier.
    ///
    /// An embedding failure does not reject the feedback: the entry is stored
    /// with a zero vector and flagged so similarity search skips it.
    pub async fn record(&self, feedback: NewFeedback) -> Result<String, FeedbackError> {
        if let Some(rating) = feedback.rating
            && !(1..=5).contains(&rating)
        {
            return Err(FeedbackError::InvalidRating { rating });
        }

        let (vector, has_embedding) = match self.embedding_client.embed(&feedback.query).await {
            Ok(vector) => (vector, true),
            Err(error) => {
                tracing::warn!(error = %error, "Storing feedback without an embedding");
                (vec![0.0; self.vector_size], false)
            }
        };

        let point_id = crate::qdrant::payload::generate_point_id();
        let payload = json!({
            "query": feedback.query,
            "response": feedback.response,
            "category": feedback.category.name(),
            "rating": feedback.rating,
            "comment": feedback.comment.unwrap_or_default(),
            "created_at": current_timestamp_rfc3339(),
            "has_embedding": has_embedding,
        });
        self.qdrant_service
            .upsert_point(&self.collection, &point_id, vector, payload)
            .await?;
        tracing::info!(point_id = %point_id, has_embedding, "Feedback recorded");
        Ok(point_id)
    }

    /// Find stored feedback whose query is similar to `query_text`.
    ///
    /// Matches must strictly exceed the threshold, carry a non-empty comment,
    /// and have been stored with a real embedding.
    pub async fn find_similar(
        &self,
        query_text: &str,
        threshold: Option<f32>,
        limit: Option<usize>,
    ) -> Result<Vec<FeedbackMatch>, FeedbackError> {
        let threshold = threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let vector = self.embedding_client.embed(query_text).await?;

        // The server-side threshold is inclusive; strictness and the comment
        // requirement are enforced here. Candidates are over-fetched so rows
        // dropped by those filters do not eat into the caller's limit.
        let fetch_limit = limit.saturating_mul(4);
        let points = self
            .qdrant_service
            .search_points(&self.collection, vector, fetch_limit, Some(threshold))
            .await?;

        Ok(points
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload?;
                if point.score <= threshold {
                    return None;
                }
                if !payload
                    .get("has_embedding")
                    .and_then(Value::as_bool)
                    .unwrap_or(true)
                {
                    return None;
                }
                let comment = payload_str(&payload, "comment");
                if comment.trim().is_empty() {
                    return None;
                }
                Some(FeedbackMatch {
                    id: point.id,
                    score: point.score,
                    query: payload_str(&payload, "query"),
                    response: payload_str(&payload, "response"),
                    category: payload_str(&payload, "category"),
                    rating: payload
                        .get("rating")
                        .and_then(Value::as_u64)
                        .map(|rating| rating as u8),
                    comment,
                    created_at: payload_str(&payload, "created_at"),
                })
            })
            .take(limit)
            .collect())
    }

    /// Aggregate counts and ratings across all stored feedback.
    pub async fn summary(&self) -> Result<FeedbackSummary, FeedbackError> {
        let payloads = self
            .qdrant_service
            .scroll_payloads(&self.collection, Value::Bool(true))
            .await?;

        let mut accumulator = Accumulator::default();
        for payload in &payloads {
            accumulator.add(payload);
        }
        Ok(accumulator.into_summary())
    }

    /// Aggregate feedback per calendar day, newest day first.
    pub async fn daily_summary(&self) -> Result<Vec<DailyFeedbackSummary>, FeedbackError> {
        let payloads = self
            .qdrant_service
            .scroll_payloads(&self.collection, Value::Bool(true))
            .await?;

        let mut days: BTreeMap<String, Accumulator> = BTreeMap::new();
        for payload in &payloads {
            let created_at = payload_str(payload, "created_at");
            let date = created_at.get(..10).unwrap_or("unknown").to_string();
            days.entry(date).or_default().add(payload);
        }

        Ok(days
            .into_iter()
            .rev()
            .map(|(date, accumulator)| accumulator.into_daily(date))
            .collect())
    }
}

#[async_trait]
impl FeedbackApi for FeedbackStore {
    async fn record(&self, feedback: NewFeedback) -> Result<String, FeedbackError> {
        FeedbackStore::record(self, feedback).await
    }

    async fn find_similar(
        &self,
        query_text: String,
        threshold: Option<f32>,
        limit: Option<usize>,
    ) -> Result<Vec<FeedbackMatch>, FeedbackError> {
        FeedbackStore::find_similar(self, &query_text, threshold, limit).await
    }

    async fn summary(&self) -> Result<FeedbackSummary, FeedbackError> {
        FeedbackStore::summary(self).await
    }

    async fn daily_summary(&self) -> Result<Vec<DailyFeedbackSummary>, FeedbackError> {
        FeedbackStore::daily_summary(self).await
    }
}

#[derive(Default)]
struct Accumulator {
    total: u64,
    rating_sum: u64,
    rating_count: u64,
    categories: BTreeMap<String, u64>,
}

impl Accumulator {
    fn add(&mut self, payload: &Map<String, Value>) {
        self.total += 1;
        if let Some(rating) = payload.get("rating").and_then(Value::as_u64) {
            self.rating_sum += rating;
            self.rating_count += 1;
        }
        let category = payload_str(payload, "category");
        if !category.is_empty() {
            *self.categories.entry(category).or_insert(0) += 1;
        }
    }

    fn average_rating(&self) -> Option<f64> {
        (self.rating_count > 0).then(|| self.rating_sum as f64 / self.rating_count as f64)
    }

    fn into_summary(self) -> FeedbackSummary {
        FeedbackSummary {
            total: self.total,
            average_rating: self.average_rating(),
            categories: self.categories,
        }
    }

    fn into_daily(self, date: String) -> DailyFeedbackSummary {
        DailyFeedbackSummary {
            date,
            total: self.total,
            average_rating: self.average_rating(),
            categories: self.categories,
        }
    }
}

fn payload_str(payload: &Map<String, Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
