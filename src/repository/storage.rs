//! Flat-file JSON storage helpers
//!
//! Collections are stored one per file as a JSON array of flat records.
//! Reads are tolerant: a missing or unparsable file is an empty collection,
//! and individually malformed records are skipped. Writes go through a
//! temporary sibling that is renamed into place.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;

pub fn read_collection<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(
                "{}: unparsable collection file, treating as empty: {}",
                path.display(),
                e
            );
            return Vec::new();
        }
    };
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("{}: skipping malformed record: {}", path.display(), e);
            }
        }
    }
    records
}

pub fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> AppResult<()> {
    let json = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
