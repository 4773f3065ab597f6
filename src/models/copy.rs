//! Physical copy model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::work::WorkId;

pub type CopyId = u32;

/// Lifecycle status of a physical copy.
///
/// `available → loaned` on loan, back to `available` on return.
/// `deleted` is terminal; it is entered from `available` when the owning
/// work is deleted, or on return of a copy that was deleted while out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    Available,
    Loaned,
    Deleted,
}

/// A physical copy of a work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCopy {
    pub copy_id: CopyId,
    pub work_id: WorkId,
    pub status: CopyStatus,
    pub registered_date: NaiveDate,
    #[serde(default)]
    pub deleted_date: Option<NaiveDate>,
}

impl BookCopy {
    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }

    pub fn is_available(&self) -> bool {
        self.status == CopyStatus::Available && !self.is_deleted()
    }
}
