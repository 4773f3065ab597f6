//! Loan and return operations

use chrono::{Duration, NaiveDate};

use crate::error::{AppError, AppResult};
use crate::models::{CopyStatus, Loan, LoanDetails, LoanId, WorkId};

use super::LibraryService;

/// Outcome of a successful return
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub loan_id: LoanId,
    pub title: String,
    pub return_date: NaiveDate,
    pub is_overdue: bool,
}

impl LibraryService {
    /// Loan the first available copy of a work to a member, due after the
    /// configured loan period.
    pub fn loan(&mut self, student_id: &str, work_id: WorkId) -> AppResult<LoanDetails> {
        if self.catalog.member(student_id).is_none() {
            return Err(AppError::NotFound(format!(
                "no member with student id {student_id}"
            )));
        }
        match self.catalog.work(work_id) {
            Some(work) if !work.is_deleted() => {}
            _ => {
                return Err(AppError::NotFound(format!(
                    "work {work_id} does not exist or is deleted"
                )))
            }
        }
        let copy_id = match self.catalog.first_available_copy(work_id) {
            Some(copy) => copy.copy_id,
            None => {
                return Err(AppError::BusinessRule(format!(
                    "no available copy of work {work_id}"
                )))
            }
        };
        // Availability implies no open loan; re-checked before mutating anyway.
        if self.catalog.open_loan_for_copy(copy_id).is_some() {
            return Err(AppError::Conflict(format!(
                "copy {copy_id} is already on loan"
            )));
        }

        let today = self.clock.today();
        let loan_id = self.catalog.next_loan_id();
        if let Some(copy) = self.catalog.copy_mut(copy_id) {
            copy.status = CopyStatus::Loaned;
        }
        let loan = Loan {
            loan_id,
            copy_id,
            work_id,
            student_id: student_id.to_string(),
            loan_date: today,
            due_date: today + Duration::days(self.loan_period_days),
            return_date: None,
        };
        self.catalog.loans.insert(loan_id, loan.clone());
        self.catalog.persist()?;
        tracing::info!(
            "loan {}: copy {} of work {} to {}",
            loan_id,
            copy_id,
            work_id,
            student_id
        );
        Ok(self.loan_details(&loan))
    }

    /// Close an open loan. The copy goes back into circulation unless it
    /// was logically deleted while out, in which case it stays deleted.
    /// Refused when any of the loan's references has gone dangling.
    pub fn return_copy(&mut self, loan_id: LoanId) -> AppResult<ReturnOutcome> {
        let (copy_id, work_id, student_id, due_date) = match self.catalog.loan(loan_id) {
            None => return Err(AppError::NotFound(format!("no loan {loan_id}"))),
            Some(loan) if !loan.is_open() => {
                return Err(AppError::BusinessRule(format!(
                    "loan {loan_id} is already closed"
                )))
            }
            Some(loan) => (
                loan.copy_id,
                loan.work_id,
                loan.student_id.clone(),
                loan.due_date,
            ),
        };
        if self.catalog.member(&student_id).is_none() {
            return Err(AppError::NotFound(format!(
                "loan {loan_id} references missing member {student_id}"
            )));
        }
        if self.catalog.work(work_id).is_none() {
            return Err(AppError::NotFound(format!(
                "loan {loan_id} references missing work {work_id}"
            )));
        }
        if self.catalog.copy(copy_id).is_none() {
            return Err(AppError::NotFound(format!(
                "loan {loan_id} references missing copy {copy_id}"
            )));
        }

        let today = self.clock.today();
        if let Some(copy) = self.catalog.copy_mut(copy_id) {
            if copy.status == CopyStatus::Loaned {
                copy.status = if copy.is_deleted() {
                    CopyStatus::Deleted
                } else {
                    CopyStatus::Available
                };
            }
        }
        if let Some(loan) = self.catalog.loan_mut(loan_id) {
            loan.return_date = Some(today);
        }
        let title = self
            .catalog
            .work(work_id)
            .map(|w| w.title.clone())
            .unwrap_or_default();
        self.catalog.persist()?;

        let is_overdue = today > due_date;
        tracing::info!(
            "return {}: copy {} on {}{}",
            loan_id,
            copy_id,
            today,
            if is_overdue { " (overdue)" } else { "" }
        );
        Ok(ReturnOutcome {
            loan_id,
            title,
            return_date: today,
            is_overdue,
        })
    }

    /// All loans, or only the open ones.
    pub fn list_loans(&self, only_open: bool) -> Vec<LoanDetails> {
        self.catalog
            .loans
            .values()
            .filter(|l| !only_open || l.is_open())
            .map(|l| self.loan_details(l))
            .collect()
    }

    /// Loans belonging to one member, open and closed.
    pub fn member_loans(&self, student_id: &str) -> Vec<LoanDetails> {
        self.catalog
            .loans
            .values()
            .filter(|l| l.student_id == student_id)
            .map(|l| self.loan_details(l))
            .collect()
    }

    fn loan_details(&self, loan: &Loan) -> LoanDetails {
        let title = self
            .catalog
            .work(loan.work_id)
            .map(|w| w.title.clone())
            .unwrap_or_else(|| "unknown".to_string());
        LoanDetails {
            loan_id: loan.loan_id,
            student_id: loan.student_id.clone(),
            title,
            copy_id: loan.copy_id,
            loan_date: loan.loan_date,
            due_date: loan.due_date,
            return_date: loan.return_date,
            is_overdue: loan.is_overdue_on(self.clock.today()),
        }
    }
}
