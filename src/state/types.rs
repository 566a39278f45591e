//! Run state types
//!
//! These types are serialized to JSON, emitted as STATE messages and
//! persisted between runs.

use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted progress of a run
///
/// `current_stream` is set while a stream is syncing and cleared only
/// once every stream in the plan has finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Stream being synced when the state was last written
    #[serde(default)]
    pub current_stream: Option<String>,

    /// Per-stream watermark
    #[serde(default)]
    pub bookmarks: BTreeMap<String, String>,

    /// Keys written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl RunState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a stream
    pub fn get_bookmark(&self, stream: &str) -> Option<&str> {
        self.bookmarks.get(stream).map(String::as_str)
    }

    /// Set the bookmark for a stream
    pub fn set_bookmark(&mut self, stream: &str, value: impl Into<String>) {
        self.bookmarks.insert(stream.to_string(), value.into());
    }
}
