//! Common types used throughout tap-eloqua
//!
//! This module contains shared type aliases and the `Watermark` type
//! used by every incremental stream.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Watermark
// ============================================================================

/// Naive layouts the APIs use for timestamps, all interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

/// Layout used when a watermark is rendered into an export filter or search.
const FILTER_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A bookmark value: the original text plus its parsed instant.
///
/// Ordering and equality only look at the parsed instant, so
/// `"2020-01-01 00:00:00"` and `"2020-01-01T00:00:00Z"` compare equal.
#[derive(Debug, Clone)]
pub struct Watermark {
    raw: String,
    at: DateTime<Utc>,
}

impl Watermark {
    /// Parse a watermark from any of the supported timestamp layouts
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let at = parse_timestamp(raw.trim())
            .ok_or_else(|| Error::watermark(&raw, "not a recognised timestamp"))?;
        Ok(Self { raw, at })
    }

    /// Build a watermark from epoch seconds, rendered as an ISO-8601 string
    pub fn from_epoch_seconds(seconds: i64) -> Result<Self> {
        let at = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| Error::watermark(seconds.to_string(), "epoch out of range"))?;
        Ok(Self {
            raw: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            at,
        })
    }

    /// Build a watermark from a JSON epoch value (number or numeric string)
    pub fn from_epoch_value(value: &serde_json::Value) -> Result<Self> {
        let seconds = match value {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64)),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match seconds {
            Some(seconds) => Self::from_epoch_seconds(seconds),
            None => Err(Error::watermark(value.to_string(), "expected epoch seconds")),
        }
    }

    /// The text this watermark was created from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed instant
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.at
    }

    /// Render as `YYYY-MM-DD HH:MM:SS` for query filters
    pub fn to_filter_string(&self) -> String {
        self.at.format(FILTER_FORMAT).to_string()
    }

    /// Consume the watermark, returning the original text
    pub fn into_string(self) -> String {
        self.raw
    }
}

impl PartialEq for Watermark {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl Eq for Watermark {}

impl PartialOrd for Watermark {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Watermark {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
