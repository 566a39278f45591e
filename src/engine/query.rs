//! Export query building
//!
//! Typed pieces of a bulk export definition and the sync job it spawns.
//! Rendering into the export query language happens only in
//! [`FilterExpression::render`] and [`placeholder`].

use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};
use crate::types::Watermark;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Instant;

static SYNC_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/syncs/([0-9]+)").expect("sync uri pattern compiles"));

/// Render `{{Root.Field}}`
pub fn placeholder(root: &str, field: &str) -> String {
    format!("{{{{{root}.{field}}}}}")
}

/// Output field name to export statement, in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<(String, String)>,
}

impl FieldSelection {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the selection from a stream's field metadata
    ///
    /// Fields are included unless explicitly deselected; automatic fields
    /// are always included. Every included field needs a statement.
    pub fn from_entry(entry: &CatalogEntry) -> Result<Self> {
        let mut selection = Self::new();
        for (name, meta) in entry.fields() {
            if !meta.is_included() {
                continue;
            }
            let statement = meta.statement.as_deref().ok_or_else(|| {
                Error::catalog(
                    &entry.stream,
                    format!("field {name} has no tap-eloqua.statement"),
                )
            })?;
            selection.insert(name, statement);
        }
        Ok(selection)
    }

    /// Add or replace a field
    pub fn insert(&mut self, name: impl Into<String>, statement: impl Into<String>) {
        let name = name.into();
        let statement = statement.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = statement,
            None => self.fields.push((name, statement)),
        }
    }

    /// Statement for a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s.as_str())
    }

    /// Selected field names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(k, v)| (k, v)))
    }
}

/// Incremental filter of an export definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression {
    /// Query-language root (e.g. `Contact`, `Activity`, `CustomObject[7]`)
    pub root: String,
    /// Update-time field on the root
    pub update_field: String,
    /// Lower bound, inclusive
    pub since: Watermark,
    /// Activity type restriction
    pub activity_type: Option<String>,
}

impl FilterExpression {
    /// Filter on `root.update_field >= since`
    pub fn since(root: impl Into<String>, update_field: impl Into<String>, since: Watermark) -> Self {
        Self {
            root: root.into(),
            update_field: update_field.into(),
            since,
            activity_type: None,
        }
    }

    /// Restrict to one activity type
    #[must_use]
    pub fn with_activity_type(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = Some(activity_type.into());
        self
    }

    /// Render into the export query language
    pub fn render(&self) -> String {
        let mut filter = format!(
            "'{}' >= '{}'",
            placeholder(&self.root, &self.update_field),
            self.since.to_filter_string()
        );
        if let Some(ref activity_type) = self.activity_type {
            filter.push_str(&format!(
                " AND '{}' = '{activity_type}'",
                placeholder("Activity", "Type")
            ));
        }
        filter
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Body of an export definition request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDefinition {
    /// Definition name
    pub name: String,
    /// Selected fields
    pub fields: FieldSelection,
    /// Rendered filter
    pub filter: String,
    /// Ask for UTC system timestamps
    #[serde(rename = "areSystemTimestampsInUTC")]
    pub are_system_timestamps_in_utc: bool,
}

impl ExportDefinition {
    /// Build a definition named after the current UTC time
    pub fn new(fields: FieldSelection, filter: &FilterExpression) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            name: format!("Singer Sync - {}", now.format("%Y-%m-%dT%H:%M:%S%.6f")),
            fields,
            filter: filter.render(),
            are_system_timestamps_in_utc: true,
        }
    }
}

/// Numeric id of a bulk sync, parsed from its `/syncs/<id>` URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncReference {
    id: u64,
}

impl SyncReference {
    /// Parse a sync URI
    pub fn parse(uri: &str) -> Result<Self> {
        let malformed = || Error::MalformedJobReference {
            uri: uri.to_string(),
        };
        let captures = SYNC_URI.captures(uri).ok_or_else(malformed)?;
        let id = captures[1].parse().map_err(|_| malformed())?;
        Ok(Self { id })
    }

    /// Sync id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Status endpoint
    pub fn status_path(&self) -> String {
        format!("/api/bulk/2.0/syncs/{}", self.id)
    }

    /// Result data endpoint
    pub fn data_path(&self) -> String {
        format!("/api/bulk/2.0/syncs/{}/data", self.id)
    }
}

impl fmt::Display for SyncReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/syncs/{}", self.id)
    }
}

/// Status of a sync job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Queued
    Pending,
    /// Running; results are readable
    Active,
    /// Finished
    Success,
    /// Any other status, treated as failure
    Other(String),
}

impl JobStatus {
    /// Parse a status string
    pub fn parse(status: &str) -> Self {
        match status {
            "pending" => Self::Pending,
            "active" => Self::Active,
            "success" => Self::Success,
            other => Self::Other(other.to_string()),
        }
    }

    /// Status string as reported by the API
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Success => "success",
            Self::Other(s) => s,
        }
    }

    /// Whether results can be drained
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Active | Self::Success)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An export job in flight
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Stream being exported
    pub stream: String,
    /// URI of the export definition
    pub definition_uri: String,
    /// The sync running the definition
    pub sync: SyncReference,
    /// Last observed status
    pub status: JobStatus,
    /// When the sync was submitted
    pub started_at: Instant,
}

impl ExportJob {
    /// A freshly submitted job
    pub fn submitted(stream: impl Into<String>, definition_uri: impl Into<String>, sync: SyncReference) -> Self {
        Self {
            stream: stream.into(),
            definition_uri: definition_uri.into(),
            sync,
            status: JobStatus::Pending,
            started_at: Instant::now(),
        }
    }
}
