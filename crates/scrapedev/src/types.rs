//! Core record types and errors for a collection run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source format of the review date text.
pub const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d";

/// A customer review, as rendered on the reviews page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub date: NaiveDate,
    pub content: String,
}

/// A product listing. The price is kept as display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    pub price: String,
}

/// A testimonial, attributed to the user named on its avatar widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub user: String,
    pub text: String,
}

/// Which kind of card a record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Review,
    Product,
    Testimonial,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Review => "review",
            RecordKind::Product => "product",
            RecordKind::Testimonial => "testimonial",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card whose extraction failed and was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedCard {
    /// Position of the card among those located at extraction time.
    pub index: usize,
    pub reason: String,
}

/// Whether a collection ran to its natural end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CollectionStatus {
    Complete,
    /// The scroll bound was reached while the document was still growing.
    SourceStillGrowing { scrolls: u32 },
}

/// Records from one collection operation.
#[derive(Debug, Clone)]
pub struct Collected<T> {
    pub records: Vec<T>,
    /// Number of cards located at extraction time.
    pub cards_seen: usize,
    pub skipped: Vec<SkippedCard>,
    pub status: CollectionStatus,
}

impl<T> Collected<T> {
    pub fn is_complete(&self) -> bool {
        self.status == CollectionStatus::Complete && self.skipped.is_empty()
    }
}

/// Errors that can occur while collecting or persisting records.
#[derive(thiserror::Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Browser(#[from] anyhow::Error),

    #[error("{kind} card {index}: no element matches `{selector}`")]
    MissingElement {
        kind: RecordKind,
        index: usize,
        selector: String,
    },

    #[error("{kind} card {index}: missing attribute `{attribute}`")]
    MissingAttribute {
        kind: RecordKind,
        index: usize,
        attribute: String,
    },

    #[error("review card {index}: invalid date {raw:?}: {source}")]
    InvalidDate {
        index: usize,
        raw: String,
        source: chrono::ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CollectError {
    /// True for failures confined to a single card.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            CollectError::MissingElement { .. }
                | CollectError::MissingAttribute { .. }
                | CollectError::InvalidDate { .. }
        )
    }
}

/// Convenience result type.
pub type CollectResult<T> = Result<T, CollectError>;
