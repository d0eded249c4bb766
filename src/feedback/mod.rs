//! User feedback capture and retrieval backed by a dedicated Qdrant collection.
//!
//! Feedback entries are embedded on their query text so later searches can
//! surface how users rated similar questions. Aggregation reads the whole
//! collection through the scroll API; the volumes involved stay small.

mod store;
mod types;

pub use store::{FeedbackApi, FeedbackStore};
pub use types::{
    DEFAULT_SEARCH_LIMIT, DEFAULT_SIMILARITY_THRESHOLD, DailyFeedbackSummary, FeedbackCategory,
    FeedbackError, FeedbackMatch, FeedbackSummary, NewFeedback,
};
