//! One-time catalog seed from an external CSV source
//!
//! Consulted only when the works collection is empty at open time. Each row
//! becomes one work (sequential ids from 1) plus its physical copies.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{norm_author_key, BookCopy, CopyStatus, Work};

use super::Catalog;

/// One row of the bootstrap catalog source
#[derive(Debug, Deserialize)]
pub struct SeedRecord {
    pub title: String,
    pub author: String,
    pub registered_date: NaiveDate,
    #[serde(default = "default_copies")]
    pub copies: u32,
}

fn default_copies() -> u32 {
    1
}

/// Read seed rows. A missing or unreadable file yields an empty seed;
/// malformed rows are skipped.
pub fn read_seed(path: &Path) -> Vec<SeedRecord> {
    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            tracing::debug!("{}: no catalog seed available: {}", path.display(), e);
            return Vec::new();
        }
    };
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("{}: skipping malformed seed row: {}", path.display(), e);
            }
        }
    }
    rows
}

/// Convert seed rows 1:1 into works and copies. The catalog is expected to
/// hold no works yet; ids are assigned sequentially from 1.
pub fn apply(catalog: &mut Catalog, rows: &[SeedRecord]) {
    let mut copy_id = 1;
    for (index, row) in rows.iter().enumerate() {
        let work_id = index as u32 + 1;
        catalog.works.insert(
            work_id,
            Work {
                work_id,
                title: row.title.trim().to_string(),
                author_key: norm_author_key(&row.author),
                author_display: row.author.trim().to_string(),
                registered_date: row.registered_date,
                deleted_date: None,
            },
        );
        for _ in 0..row.copies.max(1) {
            catalog.copies.insert(
                copy_id,
                BookCopy {
                    copy_id,
                    work_id,
                    status: CopyStatus::Available,
                    registered_date: row.registered_date,
                    deleted_date: None,
                },
            );
            copy_id += 1;
        }
    }
}
