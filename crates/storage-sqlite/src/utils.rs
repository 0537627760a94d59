//! Column encoding helpers shared by the repositories.
//!
//! Timestamps are stored as fixed-width RFC 3339 text (microsecond precision,
//! `Z` suffix) so lexical order equals chronological order and
//! `ORDER BY created_at DESC` works on the raw column.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use questboard_core::errors::{DatabaseError, Error, Result};

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::error!("Failed to parse stored timestamp '{}': {}", raw, e);
            Utc::now()
        })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Decodes a JSON text column. Corrupt content is an error, never an empty value.
pub fn from_json_column<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        log::error!("Failed to decode JSON column '{}': {}", column, e);
        Error::Database(DatabaseError::Internal(format!(
            "Corrupt '{}' column: {}",
            column, e
        )))
    })
}

pub fn to_json_column<T: Serialize>(value: &T) -> String {
    // Vec<String> and BTreeMap<String, _> of plain structs cannot fail.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
