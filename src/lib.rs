//! Librarius Library Circulation Manager
//!
//! A single-process circulation engine for a small library: works,
//! physical copies, members and loans, persisted to flat JSON files and
//! driven through a text menu. State is loaded once, repaired by an
//! integrity pass, then mutated only through the circulation operations,
//! each of which persists on success.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod repository;
pub mod services;
pub mod shell;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
