//! Data types and errors for the feedback subsystem.

use crate::{embedding::EmbeddingClientError, qdrant::QdrantError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Minimum similarity score a match must strictly exceed by default.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;
/// Default number of candidates requested from the similarity search.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Errors produced by the feedback store.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Submitted category is not one of the registered names.
    #[error("unknown feedback category '{name}'; valid categories: {valid}")]
    InvalidCategory {
        /// Name supplied by the caller.
        name: String,
        /// Comma-separated list of valid category names.
        valid: String,
    },
    /// Rating outside the accepted 1 to 5 range.
    #[error("rating must be between 1 and 5, got {rating}")]
    InvalidRating {
        /// Rating supplied by the caller.
        rating: u8,
    },
    /// Embedding provider failed while searching.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Qdrant interaction failed.
    #[error(transparent)]
    Qdrant(#[from] QdrantError),
}

/// Coarse classification of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    /// The response answered the question.
    Helpful,
    /// The response missed the question.
    NotHelpful,
    /// The response was partially useful.
    Partial,
    /// The response was thorough beyond the question.
    Detailed,
}

impl FeedbackCategory {
    const ALL: [FeedbackCategory; 4] = [
        FeedbackCategory::Helpful,
        FeedbackCategory::NotHelpful,
        FeedbackCategory::Partial,
        FeedbackCategory::Detailed,
    ];

    /// Stable name used in request and payload fields.
    pub const fn name(self) -> &'static str {
        match self {
            FeedbackCategory::Helpful => "helpful",
            FeedbackCategory::NotHelpful => "not_helpful",
            FeedbackCategory::Partial => "partial",
            FeedbackCategory::Detailed => "detailed",
        }
    }

    /// Resolve a category by its registered name.
    pub fn from_name(name: &str) -> Result<Self, FeedbackError> {
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.name() == name)
            .ok_or_else(|| FeedbackError::InvalidCategory {
                name: name.to_string(),
                valid: Self::ALL
                    .iter()
                    .map(|category| category.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// A feedback submission as received from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    /// Question the user asked.
    pub query: String,
    /// Answer the system produced.
    pub response: String,
    /// User's classification of the answer.
    pub category: FeedbackCategory,
    /// Optional 1 to 5 star rating.
    #[serde(default)]
    pub rating: Option<u8>,
    /// Optional free-form comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// One stored feedback entry returned by a similarity search.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackMatch {
    /// Point identifier in the feedback collection.
    pub id: String,
    /// Similarity score against the search query.
    pub score: f32,
    /// Original question.
    pub query: String,
    /// Answer the user rated.
    pub response: String,
    /// Category name as stored.
    pub category: String,
    /// Star rating, when given.
    pub rating: Option<u8>,
    /// User comment.
    pub comment: String,
    /// RFC 3339 submission timestamp.
    pub created_at: String,
}

/// Aggregate view over the whole feedback collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    /// Total number of stored entries.
    pub total: u64,
    /// Mean of all submitted ratings, absent when none were given.
    pub average_rating: Option<f64>,
    /// Entry count per category name.
    pub categories: BTreeMap<String, u64>,
}

/// Aggregate view over the feedback submitted on one calendar day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFeedbackSummary {
    /// Calendar day in `YYYY-MM-DD` form.
    pub date: String,
    /// Entries submitted on that day.
    pub total: u64,
    /// Mean rating for that day, absent when none were given.
    pub average_rating: Option<f64>,
    /// Entry count per category name for that day.
    pub categories: BTreeMap<String, u64>,
}
