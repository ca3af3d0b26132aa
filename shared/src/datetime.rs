//! Lenient ISO-8601 parsing for event timestamps.
//!
//! Event times are stored naive. Clients send whatever their date pickers
//! produce, so a few shapes are accepted:
//!
//! - `2024-01-01T10:00:00`, `2024-01-01T10:00:00.250`, `2024-01-01T10:00`
//! - the same with a space instead of `T`
//! - `2024-01-01` (midnight)
//! - RFC 3339 with `Z` or an offset, normalised to UTC

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a client-supplied timestamp into a naive datetime.
pub fn parse(input: &str) -> Result<NaiveDateTime, String> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(format!("invalid datetime: {:?}", input))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// `null` and absence both map to `None`.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse(&raw).map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
