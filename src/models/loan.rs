//! Loan (borrow) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::copy::CopyId;
use super::work::WorkId;

pub type LoanId = u32;

/// A loan event. Open while `return_date` is `None`; closing it by setting
/// `return_date` is the only mutation a loan ever sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub copy_id: CopyId,
    pub work_id: WorkId,
    pub student_id: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// An open loan past its due date counts as overdue; closed loans never do.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        self.is_open() && today > self.due_date
    }
}

/// Loan with display details for listings
#[derive(Debug, Clone, Serialize)]
pub struct LoanDetails {
    pub loan_id: LoanId,
    pub student_id: String,
    pub title: String,
    pub copy_id: CopyId,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub is_overdue: bool,
}
