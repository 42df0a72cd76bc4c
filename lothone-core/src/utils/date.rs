//! Calendar date serialization/deserialization helpers.
//!
//! Provides custom Serde serialization/deserialization support:
//! - Serialization: `NaiveDate` -> `YYYY-MM-DD` string
//! - Deserialization: `YYYY-MM-DD` or RFC3339 string -> `NaiveDate`

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serializer};

/// Date format shared by the console forms and the collection files
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse(s: &str) -> Option<NaiveDate> {
    // chrono accepts single-digit months/days for %m/%d; the console always zero-pads.
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Serializes `NaiveDate` as `YYYY-MM-DD`.
pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// Deserializes `NaiveDate` from `YYYY-MM-DD` or an RFC3339 timestamp.
///
/// Older collection files may carry full timestamps; only the date part is kept.
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let s = String::deserialize(deserializer)?;
    if let Some(date) = parse(&s) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.date_naive())
        .map_err(|e| Error::custom(format!("Invalid date '{s}': {e}")))
}
