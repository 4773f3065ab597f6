//! Work (bibliographic record) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

pub type WorkId = u32;

/// A catalogued work. Physical copies are tracked separately as
/// [`BookCopy`](crate::models::BookCopy) records referencing `work_id`.
///
/// Deletion is logical: a set `deleted_date` removes the work from every
/// listing and from loan eligibility, but the record itself is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Work {
    pub work_id: WorkId,
    pub title: String,
    /// Normalized author name used for duplicate detection.
    pub author_key: String,
    /// Author name as entered, for display.
    pub author_display: String,
    pub registered_date: NaiveDate,
    #[serde(default)]
    pub deleted_date: Option<NaiveDate>,
}

impl Work {
    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }
}

/// Normalize an author name for identity comparison: NFKC, lower-cased,
/// whitespace collapsed to single spaces.
pub fn norm_author_key(author: &str) -> String {
    author
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Listing row for a work with its copy availability counts
#[derive(Debug, Clone, Serialize)]
pub struct WorkSummary {
    pub work_id: WorkId,
    pub title: String,
    pub author: String,
    pub nb_copies: usize,
    pub nb_available: usize,
}
