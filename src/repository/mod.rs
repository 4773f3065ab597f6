//! Catalog store: the in-memory collections and their flat-file persistence
//!
//! The store is the only source of truth during a session. Collections are
//! id-keyed `IndexMap`s so lookups are O(1) while iteration keeps storage
//! (insertion) order, which "first available copy" selection relies on.

pub mod seed;
mod storage;

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::AppResult;
use crate::models::{BookCopy, CopyId, CopyStatus, Loan, LoanId, Member, Work, WorkId};

const WORKS_FILE: &str = "works.json";
const COPIES_FILE: &str = "copies.json";
const MEMBERS_FILE: &str = "members.json";
const LOANS_FILE: &str = "loans.json";
const DELETED_WORKS_FILE: &str = "deleted_works.json";

pub struct Catalog {
    data_dir: PathBuf,
    pub(crate) works: IndexMap<WorkId, Work>,
    pub(crate) copies: IndexMap<CopyId, BookCopy>,
    pub(crate) members: IndexMap<String, Member>,
    pub(crate) loans: IndexMap<LoanId, Loan>,
}

impl Catalog {
    /// Open a data directory and load all collections. Missing or corrupt
    /// files load as empty collections.
    pub fn open(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        let mut works: IndexMap<WorkId, Work> = IndexMap::new();
        for work in storage::read_collection::<Work>(&data_dir.join(WORKS_FILE)) {
            works.insert(work.work_id, work);
        }

        // Merge the deleted-works side file: in memory the works collection
        // is the single source of truth, with deletion carried as a marker.
        for side in storage::read_collection::<Work>(&data_dir.join(DELETED_WORKS_FILE)) {
            match works.get_mut(&side.work_id) {
                Some(existing) => {
                    if existing.deleted_date.is_none() && side.deleted_date.is_some() {
                        existing.deleted_date = side.deleted_date;
                    }
                }
                None => {
                    works.insert(side.work_id, side);
                }
            }
        }

        let mut copies: IndexMap<CopyId, BookCopy> = IndexMap::new();
        for copy in storage::read_collection::<BookCopy>(&data_dir.join(COPIES_FILE)) {
            copies.insert(copy.copy_id, copy);
        }

        let mut members: IndexMap<String, Member> = IndexMap::new();
        for member in storage::read_collection::<Member>(&data_dir.join(MEMBERS_FILE)) {
            members.insert(member.student_id.clone(), member);
        }

        let mut loans: IndexMap<LoanId, Loan> = IndexMap::new();
        for loan in storage::read_collection::<Loan>(&data_dir.join(LOANS_FILE)) {
            loans.insert(loan.loan_id, loan);
        }

        Ok(Self {
            data_dir,
            works,
            copies,
            members,
            loans,
        })
    }

    /// Open a data directory, consulting the seed source once if no works
    /// have been persisted yet.
    pub fn open_with_seed(data_dir: impl Into<PathBuf>, seed_file: &Path) -> AppResult<Self> {
        let mut catalog = Self::open(data_dir)?;
        if catalog.works.is_empty() {
            let rows = seed::read_seed(seed_file);
            if !rows.is_empty() {
                seed::apply(&mut catalog, &rows);
                catalog.persist()?;
                tracing::info!(
                    "seeded catalog with {} work(s) from {}",
                    catalog.works.len(),
                    seed_file.display()
                );
            }
        }
        Ok(catalog)
    }

    /// Rewrite all five collection files. The deleted-works file is a
    /// derived view of the works collection.
    pub fn persist(&self) -> AppResult<()> {
        let works: Vec<&Work> = self.works.values().collect();
        storage::write_collection(&self.data_dir.join(WORKS_FILE), &works)?;

        let copies: Vec<&BookCopy> = self.copies.values().collect();
        storage::write_collection(&self.data_dir.join(COPIES_FILE), &copies)?;

        let members: Vec<&Member> = self.members.values().collect();
        storage::write_collection(&self.data_dir.join(MEMBERS_FILE), &members)?;

        let loans: Vec<&Loan> = self.loans.values().collect();
        storage::write_collection(&self.data_dir.join(LOANS_FILE), &loans)?;

        let deleted: Vec<&Work> = self.works.values().filter(|w| w.is_deleted()).collect();
        storage::write_collection(&self.data_dir.join(DELETED_WORKS_FILE), &deleted)?;

        tracing::debug!("catalog persisted to {}", self.data_dir.display());
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // -----------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------

    pub fn work(&self, id: WorkId) -> Option<&Work> {
        self.works.get(&id)
    }

    pub(crate) fn work_mut(&mut self, id: WorkId) -> Option<&mut Work> {
        self.works.get_mut(&id)
    }

    pub fn copy(&self, id: CopyId) -> Option<&BookCopy> {
        self.copies.get(&id)
    }

    pub(crate) fn copy_mut(&mut self, id: CopyId) -> Option<&mut BookCopy> {
        self.copies.get_mut(&id)
    }

    pub fn member(&self, student_id: &str) -> Option<&Member> {
        self.members.get(student_id)
    }

    pub fn loan(&self, id: LoanId) -> Option<&Loan> {
        self.loans.get(&id)
    }

    pub(crate) fn loan_mut(&mut self, id: LoanId) -> Option<&mut Loan> {
        self.loans.get_mut(&id)
    }

    /// Non-deleted work matching `(title, author_key)`, if any.
    pub fn find_active_work(&self, title: &str, author_key: &str) -> Option<&Work> {
        self.works
            .values()
            .find(|w| !w.is_deleted() && w.title == title && w.author_key == author_key)
    }

    /// First copy of the work, in storage order, that can go out on loan.
    pub fn first_available_copy(&self, work_id: WorkId) -> Option<&BookCopy> {
        self.copies
            .values()
            .find(|c| c.work_id == work_id && c.is_available())
    }

    /// The open loan holding a copy, if any.
    pub fn open_loan_for_copy(&self, copy_id: CopyId) -> Option<&Loan> {
        self.loans
            .values()
            .find(|l| l.copy_id == copy_id && l.is_open())
    }

    pub fn open_loans_for_work(&self, work_id: WorkId) -> usize {
        self.loans
            .values()
            .filter(|l| l.work_id == work_id && l.is_open())
            .count()
    }

    pub fn open_loans_for_member(&self, student_id: &str) -> usize {
        self.loans
            .values()
            .filter(|l| l.student_id == student_id && l.is_open())
            .count()
    }

    /// `(total, available)` copy counts for a work.
    pub fn copy_counts(&self, work_id: WorkId) -> (usize, usize) {
        let mut total = 0;
        let mut available = 0;
        for copy in self.copies.values().filter(|c| c.work_id == work_id) {
            total += 1;
            if copy.status == CopyStatus::Available {
                available += 1;
            }
        }
        (total, available)
    }

    // -----------------------------------------------------------------
    // Id allocation
    // -----------------------------------------------------------------

    pub fn next_work_id(&self) -> WorkId {
        next_id(&self.works)
    }

    pub fn next_copy_id(&self) -> CopyId {
        next_id(&self.copies)
    }

    pub fn next_loan_id(&self) -> LoanId {
        next_id(&self.loans)
    }
}

/// Next id: max(existing) + 1, stepped past any id already in use.
fn next_id<V>(map: &IndexMap<u32, V>) -> u32 {
    let mut id = map.keys().max().copied().unwrap_or(0) + 1;
    while map.contains_key(&id) {
        id += 1;
    }
    id
}
