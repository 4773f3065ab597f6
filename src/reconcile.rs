//! Integrity pass over a freshly loaded catalog
//!
//! Runs exactly once, between load and the first circulation operation, and
//! repairs the four classes of inconsistency that persisted state can carry:
//! copies orphaned by a deleted work, dangling foreign keys, duplicate open
//! loans on one copy, and date-logic violations. The passes run in this
//! order; later passes assume the postconditions of earlier ones. Each pass
//! is idempotent, so re-running the whole thing on repaired state changes
//! nothing.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;

use crate::models::{CopyId, CopyStatus, LoanId, WorkId};
use crate::repository::Catalog;

/// What the integrity pass changed, by repair class
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepairReport {
    /// Copies under a deleted work that were missing their deletion marker.
    pub cascaded_copies: usize,
    /// Copies referencing a work that does not exist.
    pub dropped_copies: usize,
    /// Loans referencing a member or copy that does not exist.
    pub dropped_loans: usize,
    /// Extra open loans on one copy, force-closed.
    pub closed_duplicate_loans: usize,
    /// Due dates not equal to loan date plus the loan period.
    pub repaired_due_dates: usize,
    /// Return dates earlier than their loan date.
    pub repaired_return_dates: usize,
}

impl RepairReport {
    pub fn total(&self) -> usize {
        self.cascaded_copies
            + self.dropped_copies
            + self.dropped_loans
            + self.closed_duplicate_loans
            + self.repaired_due_dates
            + self.repaired_return_dates
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Repair the catalog in place and report what changed.
pub fn reconcile(catalog: &mut Catalog, today: NaiveDate, loan_period_days: i64) -> RepairReport {
    let mut report = RepairReport::default();
    cascade_deleted_works(catalog, today, &mut report);
    drop_dangling_references(catalog, &mut report);
    close_duplicate_open_loans(catalog, &mut report);
    repair_date_logic(catalog, loan_period_days, &mut report);

    if !report.is_clean() {
        tracing::info!(
            "integrity pass: {} cascaded, {} dangling copies dropped, {} dangling loans dropped, \
             {} duplicate loans closed, {} due dates fixed, {} return dates fixed",
            report.cascaded_copies,
            report.dropped_copies,
            report.dropped_loans,
            report.closed_duplicate_loans,
            report.repaired_due_dates,
            report.repaired_return_dates,
        );
    }
    report
}

/// Copies under a logically-deleted work inherit the deletion marker.
/// Only copies sitting available flip to `deleted`; a copy still out on
/// loan keeps its status until returned.
fn cascade_deleted_works(catalog: &mut Catalog, today: NaiveDate, report: &mut RepairReport) {
    let deleted_works: HashSet<WorkId> = catalog
        .works
        .values()
        .filter(|w| w.is_deleted())
        .map(|w| w.work_id)
        .collect();

    for copy in catalog.copies.values_mut() {
        if deleted_works.contains(&copy.work_id) && copy.deleted_date.is_none() {
            copy.deleted_date = Some(today);
            if copy.status == CopyStatus::Available {
                copy.status = CopyStatus::Deleted;
            }
            report.cascaded_copies += 1;
        }
    }
}

/// Drop copies whose work does not exist, and loans whose member or copy
/// does not exist. Existence is by identity; logically-deleted records
/// still count as existing.
fn drop_dangling_references(catalog: &mut Catalog, report: &mut RepairReport) {
    let work_ids: HashSet<WorkId> = catalog.works.keys().copied().collect();
    let before = catalog.copies.len();
    catalog.copies.retain(|_, c| work_ids.contains(&c.work_id));
    report.dropped_copies += before - catalog.copies.len();

    let copy_ids: HashSet<CopyId> = catalog.copies.keys().copied().collect();
    let member_ids: HashSet<String> = catalog.members.keys().cloned().collect();
    let before = catalog.loans.len();
    catalog
        .loans
        .retain(|_, l| member_ids.contains(&l.student_id) && copy_ids.contains(&l.copy_id));
    report.dropped_loans += before - catalog.loans.len();
}

/// Where one copy carries several open loans, keep open the loan with the
/// latest loan date (ties broken toward the lowest loan id) and force-close
/// the rest on their own loan date.
fn close_duplicate_open_loans(catalog: &mut Catalog, report: &mut RepairReport) {
    let mut open_by_copy: IndexMap<CopyId, Vec<(LoanId, NaiveDate)>> = IndexMap::new();
    for loan in catalog.loans.values() {
        if loan.is_open() {
            open_by_copy
                .entry(loan.copy_id)
                .or_default()
                .push((loan.loan_id, loan.loan_date));
        }
    }

    for (_copy_id, group) in open_by_copy {
        if group.len() < 2 {
            continue;
        }
        let keep = group
            .iter()
            .max_by_key(|(id, date)| (*date, Reverse(*id)))
            .map(|(id, _)| *id);
        for (id, _) in group {
            if Some(id) == keep {
                continue;
            }
            if let Some(loan) = catalog.loan_mut(id) {
                loan.return_date = Some(loan.loan_date);
                report.closed_duplicate_loans += 1;
            }
        }
    }
}

/// Recompute every due date from its loan date, and pull any return date
/// that precedes its loan date up to the loan date.
fn repair_date_logic(catalog: &mut Catalog, loan_period_days: i64, report: &mut RepairReport) {
    let period = Duration::days(loan_period_days);
    for loan in catalog.loans.values_mut() {
        let expected = loan.loan_date + period;
        if loan.due_date != expected {
            loan.due_date = expected;
            report.repaired_due_dates += 1;
        }
        if let Some(return_date) = loan.return_date {
            if return_date < loan.loan_date {
                loan.return_date = Some(loan.loan_date);
                report.repaired_return_dates += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookCopy, Loan, Member, Work};

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn catalog() -> Catalog {
        // Nothing here persists, so the tempdir may go away immediately.
        let dir = tempfile::tempdir().unwrap();
        Catalog::open(dir.path()).unwrap()
    }

    fn work(id: WorkId, deleted: Option<&str>) -> Work {
        Work {
            work_id: id,
            title: format!("Work {id}"),
            author_key: "author".into(),
            author_display: "Author".into(),
            registered_date: d("2025-01-01"),
            deleted_date: deleted.map(d),
        }
    }

    fn copy(id: CopyId, work_id: WorkId, status: CopyStatus) -> BookCopy {
        BookCopy {
            copy_id: id,
            work_id,
            status,
            registered_date: d("2025-01-01"),
            deleted_date: None,
        }
    }

    fn member(student_id: &str) -> Member {
        Member {
            student_id: student_id.into(),
            name: "홍길동".into(),
            phone: "010-1111-2222".into(),
            password: "pass1234".into(),
            registered_date: d("2025-01-01"),
        }
    }

    fn loan(id: LoanId, copy_id: CopyId, loan_date: &str) -> Loan {
        Loan {
            loan_id: id,
            copy_id,
            work_id: 1,
            student_id: "20230001".into(),
            loan_date: d(loan_date),
            due_date: d(loan_date) + Duration::days(14),
            return_date: None,
        }
    }

    #[test]
    fn cascades_deletion_to_orphaned_copies() {
        let mut c = catalog();
        c.works.insert(1, work(1, Some("2025-02-01")));
        c.copies.insert(1, copy(1, 1, CopyStatus::Available));
        c.copies.insert(2, copy(2, 1, CopyStatus::Loaned));

        let report = reconcile(&mut c, d("2025-03-01"), 14);
        assert_eq!(report.cascaded_copies, 2);

        let first = c.copy(1).unwrap();
        assert_eq!(first.status, CopyStatus::Deleted);
        assert_eq!(first.deleted_date, Some(d("2025-03-01")));
        // A copy still out keeps its status until returned.
        let second = c.copy(2).unwrap();
        assert_eq!(second.status, CopyStatus::Loaned);
        assert_eq!(second.deleted_date, Some(d("2025-03-01")));
    }

    #[test]
    fn drops_dangling_copies_and_loans() {
        let mut c = catalog();
        c.works.insert(1, work(1, None));
        c.members.insert("20230001".into(), member("20230001"));
        c.copies.insert(1, copy(1, 1, CopyStatus::Loaned));
        c.copies.insert(2, copy(2, 99, CopyStatus::Available)); // no such work
        c.loans.insert(1, loan(1, 1, "2025-02-01"));
        c.loans.insert(2, loan(2, 42, "2025-02-01")); // no such copy
        let mut stranger = loan(3, 1, "2025-02-02");
        stranger.student_id = "19990009".into(); // no such member
        c.loans.insert(3, stranger);

        let report = reconcile(&mut c, d("2025-03-01"), 14);
        assert_eq!(report.dropped_copies, 1);
        assert_eq!(report.dropped_loans, 2);
        assert!(c.copy(2).is_none());
        assert!(c.loan(2).is_none());
        assert!(c.loan(3).is_none());
        assert!(c.loan(1).is_some());
    }

    #[test]
    fn keeps_latest_open_loan_per_copy() {
        let mut c = catalog();
        c.works.insert(1, work(1, None));
        c.members.insert("20230001".into(), member("20230001"));
        c.copies.insert(1, copy(1, 1, CopyStatus::Loaned));
        c.loans.insert(1, loan(1, 1, "2025-02-01"));
        c.loans.insert(2, loan(2, 1, "2025-02-05"));
        c.loans.insert(3, loan(3, 1, "2025-02-03"));

        let report = reconcile(&mut c, d("2025-03-01"), 14);
        assert_eq!(report.closed_duplicate_loans, 2);
        assert!(c.loan(2).unwrap().is_open());
        // Force-closed on their own loan date.
        assert_eq!(c.loan(1).unwrap().return_date, Some(d("2025-02-01")));
        assert_eq!(c.loan(3).unwrap().return_date, Some(d("2025-02-03")));
    }

    #[test]
    fn duplicate_tie_breaks_toward_lowest_loan_id() {
        let mut c = catalog();
        c.works.insert(1, work(1, None));
        c.members.insert("20230001".into(), member("20230001"));
        c.copies.insert(1, copy(1, 1, CopyStatus::Loaned));
        c.loans.insert(4, loan(4, 1, "2025-02-01"));
        c.loans.insert(7, loan(7, 1, "2025-02-01"));

        reconcile(&mut c, d("2025-03-01"), 14);
        assert!(c.loan(4).unwrap().is_open());
        assert!(!c.loan(7).unwrap().is_open());
    }

    #[test]
    fn repairs_due_and_return_dates() {
        let mut c = catalog();
        c.works.insert(1, work(1, None));
        c.members.insert("20230001".into(), member("20230001"));
        c.copies.insert(1, copy(1, 1, CopyStatus::Available));
        let mut bad_due = loan(1, 1, "2025-02-01");
        bad_due.due_date = d("2025-02-10");
        bad_due.return_date = Some(d("2025-02-02"));
        c.loans.insert(1, bad_due);
        let mut bad_return = loan(2, 1, "2025-02-05");
        bad_return.return_date = Some(d("2025-01-01"));
        c.loans.insert(2, bad_return);

        let report = reconcile(&mut c, d("2025-03-01"), 14);
        assert_eq!(report.repaired_due_dates, 1);
        assert_eq!(report.repaired_return_dates, 1);
        assert_eq!(c.loan(1).unwrap().due_date, d("2025-02-15"));
        assert_eq!(c.loan(2).unwrap().return_date, Some(d("2025-02-05")));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut c = catalog();
        c.works.insert(1, work(1, Some("2025-02-01")));
        c.works.insert(2, work(2, None));
        c.members.insert("20230001".into(), member("20230001"));
        c.copies.insert(1, copy(1, 1, CopyStatus::Available));
        c.copies.insert(2, copy(2, 99, CopyStatus::Available));
        c.copies.insert(3, copy(3, 2, CopyStatus::Loaned));
        c.loans.insert(1, loan(1, 3, "2025-02-01"));
        let mut dup = loan(2, 3, "2025-02-01");
        dup.due_date = d("2025-02-03");
        c.loans.insert(2, dup);

        let first = reconcile(&mut c, d("2025-03-01"), 14);
        assert!(!first.is_clean());

        let second = reconcile(&mut c, d("2025-03-02"), 14);
        assert!(second.is_clean(), "second pass must repair nothing: {second:?}");
    }
}
