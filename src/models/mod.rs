//! Domain models

pub mod copy;
pub mod loan;
pub mod member;
pub mod work;

pub use copy::{BookCopy, CopyId, CopyStatus};
pub use loan::{Loan, LoanDetails, LoanId};
pub use member::{Member, RegisterMember};
pub use work::{norm_author_key, Work, WorkId, WorkSummary};
