//! Business logic services
//!
//! `LibraryService` is the circulation engine: it owns the catalog store
//! and the virtual clock, and every mutation goes through one of its
//! operations, which validate references first and persist on success.
//! The operation groups live in sibling modules: member management in
//! `members`, work/copy cataloguing in `catalog`, loans in `loans`.

pub mod catalog;
pub mod loans;
pub mod members;

use chrono::NaiveDate;

use crate::clock::Clock;
use crate::config::CirculationConfig;
use crate::error::AppResult;
use crate::reconcile::{self, RepairReport};
use crate::repository::Catalog;

pub use catalog::AddWorkOutcome;
pub use loans::ReturnOutcome;

pub struct LibraryService {
    pub(crate) catalog: Catalog,
    pub(crate) clock: Clock,
    pub(crate) loan_period_days: i64,
}

impl LibraryService {
    /// Boot the engine over a freshly loaded catalog: run the integrity
    /// pass, persisting once if anything was repaired, then accept
    /// operations.
    pub fn boot(
        mut catalog: Catalog,
        clock: Clock,
        config: &CirculationConfig,
    ) -> AppResult<(Self, RepairReport)> {
        let report = reconcile::reconcile(&mut catalog, clock.today(), config.loan_period_days);
        if !report.is_clean() {
            catalog.persist()?;
        }
        let service = Self {
            catalog,
            clock,
            loan_period_days: config.loan_period_days,
        };
        Ok((service, report))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Move the virtual today forward; refuses to travel into the past.
    pub fn advance_today(&mut self, new_date: NaiveDate) -> AppResult<()> {
        self.clock.advance(new_date)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}
