//! Export row normalization
//!
//! Bulk export rows render missing values as empty strings; they are
//! emitted as nulls.

use crate::types::{JsonObject, JsonValue};

/// Replace empty-string values with null; everything else passes through
pub fn normalize_export_row(row: JsonObject) -> JsonObject {
    row.into_iter()
        .map(|(field, value)| match value {
            JsonValue::String(ref s) if s.is_empty() => (field, JsonValue::Null),
            other => (field, other),
        })
        .collect()
}
