//! Catalog types
//!
//! The Singer catalog: streams with their JSON schema, key properties and
//! breadcrumb-addressed metadata.

use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Field inclusion as declared in catalog metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    /// Included when selected
    #[default]
    Available,
    /// Always included
    Automatic,
    /// Never included
    Unsupported,
}

/// Metadata attached to a breadcrumb
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Explicit selection flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    /// Inclusion rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    /// Export query-language statement for a field (e.g. `{{Contact.Field(C_EmailAddress)}}`)
    #[serde(
        rename = "tap-eloqua.statement",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub statement: Option<String>,

    /// Remote object or field id
    #[serde(
        rename = "tap-eloqua.id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    /// Root name used in export filters (e.g. `Contact`, `CustomObject[12]`)
    #[serde(
        rename = "tap-eloqua.query-language-name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub query_language_name: Option<String>,

    /// Key properties of the stream
    #[serde(
        rename = "table-key-properties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub table_key_properties: Option<Vec<String>>,

    /// Any other metadata keys, preserved as-is
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl FieldMetadata {
    /// Whether this field goes into an export: selected unless explicitly
    /// deselected, and always when automatic
    pub fn is_included(&self) -> bool {
        match self.inclusion {
            Some(Inclusion::Automatic) => true,
            Some(Inclusion::Unsupported) => false,
            _ => self.selected.unwrap_or(true),
        }
    }
}

/// One metadata entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream root, `["properties", <field>]` for a field
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// The metadata itself
    #[serde(default)]
    pub metadata: FieldMetadata,
}

impl MetadataEntry {
    /// Root metadata entry
    pub fn root(metadata: FieldMetadata) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Field metadata entry
    pub fn field(name: impl Into<String>, metadata: FieldMetadata) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.into()],
            metadata,
        }
    }

    /// Whether this is the stream root
    pub fn is_root(&self) -> bool {
        self.breadcrumb.is_empty()
    }

    /// Field name for a `["properties", <field>]` breadcrumb
    pub fn field_name(&self) -> Option<&str> {
        match self.breadcrumb.as_slice() {
            [properties, name] if properties == "properties" => Some(name.as_str()),
            _ => None,
        }
    }
}

/// A stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable stream id
    pub tap_stream_id: String,

    /// Stream name
    pub stream: String,

    /// JSON schema
    #[serde(default)]
    pub schema: Value,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Root and field metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Create an entry whose id and name are both `name`
    pub fn new(name: impl Into<String>, schema: Value, key_properties: Vec<String>) -> Self {
        let name = name.into();
        Self {
            tap_stream_id: name.clone(),
            stream: name,
            schema,
            key_properties,
            metadata: Vec::new(),
        }
    }

    /// Attach metadata entries
    #[must_use]
    pub fn with_metadata(mut self, metadata: Vec<MetadataEntry>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Root metadata, if present
    pub fn root_metadata(&self) -> Option<&FieldMetadata> {
        self.metadata
            .iter()
            .find(|m| m.is_root())
            .map(|m| &m.metadata)
    }

    /// Mutable root metadata, created if missing
    pub fn root_metadata_mut(&mut self) -> &mut FieldMetadata {
        let index = match self.metadata.iter().position(MetadataEntry::is_root) {
            Some(index) => index,
            None => {
                self.metadata.insert(0, MetadataEntry::root(FieldMetadata::default()));
                0
            }
        };
        &mut self.metadata[index].metadata
    }

    /// Whether the stream is selected for this run
    pub fn is_selected(&self) -> bool {
        self.root_metadata()
            .and_then(|m| m.selected)
            .unwrap_or(false)
    }

    /// Root name for the export query language
    pub fn query_language_name(&self) -> Option<&str> {
        self.root_metadata()
            .and_then(|m| m.query_language_name.as_deref())
    }

    /// Custom object id, present only for custom-object streams
    pub fn custom_object_id(&self) -> Option<&str> {
        self.root_metadata()
            .and_then(|m| m.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Field metadata entries paired with their field names
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldMetadata)> {
        self.metadata
            .iter()
            .filter_map(|m| m.field_name().map(|name| (name, &m.metadata)))
    }
}

/// The catalog handed to a sync run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Streams, in order
    #[serde(default)]
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Look up a stream by id or name
    pub fn get_stream(&self, name: &str) -> Option<&CatalogEntry> {
        self.streams
            .iter()
            .find(|s| s.tap_stream_id == name || s.stream == name)
    }

    /// Look up a stream, failing if it is absent
    pub fn require_stream(&self, name: &str) -> Result<&CatalogEntry> {
        self.get_stream(name)
            .ok_or_else(|| Error::StreamNotFound {
                stream: name.to_string(),
            })
    }

    /// Ids of the selected streams
    pub fn selected_streams(&self) -> Vec<&str> {
        self.streams
            .iter()
            .filter(|s| s.is_selected())
            .map(|s| s.tap_stream_id.as_str())
            .collect()
    }

    /// Streams backed by custom objects, in catalog order
    pub fn custom_object_streams(&self) -> Vec<&CatalogEntry> {
        self.streams
            .iter()
            .filter(|s| s.custom_object_id().is_some())
            .collect()
    }

    /// Number of streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether the catalog has no streams
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
