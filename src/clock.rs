//! Virtual "today" clock
//!
//! The whole program runs against a single virtual date. It may start in the
//! past (handy for replaying a data set) but never moves backward once set.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// Monotonic virtual-date clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    today: NaiveDate,
}

impl Clock {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Move the virtual today forward. Same-day is accepted; moving
    /// backward is refused.
    pub fn advance(&mut self, new_date: NaiveDate) -> AppResult<()> {
        if new_date < self.today {
            return Err(AppError::InvalidDate(format!(
                "cannot move today back from {} to {}",
                self.today, new_date
            )));
        }
        self.today = new_date;
        Ok(())
    }
}
