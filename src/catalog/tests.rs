//! Tests for the catalog module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

const CATALOG: &str = r#"{
  "streams": [
    {
      "tap_stream_id": "contacts",
      "stream": "contacts",
      "key_properties": ["id"],
      "schema": {"type": "object", "properties": {"Id": {"type": "string"}}},
      "metadata": [
        {"breadcrumb": [], "metadata": {
          "selected": true,
          "tap-eloqua.query-language-name": "Contact",
          "table-key-properties": ["id"]
        }},
        {"breadcrumb": ["properties", "Id"], "metadata": {
          "inclusion": "automatic",
          "selected": false,
          "tap-eloqua.statement": "{{Contact.Id}}"
        }},
        {"breadcrumb": ["properties", "EmailAddress"], "metadata": {
          "inclusion": "available",
          "tap-eloqua.statement": "{{Contact.Field(C_EmailAddress)}}",
          "tap-eloqua.id": "100001",
          "selected-by-default": true
        }}
      ]
    },
    {
      "tap_stream_id": "widgets",
      "stream": "widgets",
      "key_properties": ["id"],
      "schema": {"type": "object", "properties": {}},
      "metadata": [
        {"breadcrumb": [], "metadata": {
          "tap-eloqua.id": "12",
          "tap-eloqua.query-language-name": "CustomObject[12]"
        }}
      ]
    },
    {
      "tap_stream_id": "emails",
      "stream": "emails",
      "key_properties": ["id"],
      "schema": {"type": "object", "properties": {}},
      "metadata": [{"breadcrumb": [], "metadata": {"selected": true}}]
    }
  ]
}"#;

#[test]
fn test_parse_catalog() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    assert_eq!(catalog.len(), 3);

    let contacts = catalog.get_stream("contacts").unwrap();
    assert_eq!(contacts.key_properties, vec!["id"]);
    assert_eq!(contacts.query_language_name(), Some("Contact"));
    assert!(contacts.is_selected());
    assert_eq!(contacts.custom_object_id(), None);
}

#[test]
fn test_selected_streams() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    assert_eq!(catalog.selected_streams(), vec!["contacts", "emails"]);
}

#[test]
fn test_custom_object_streams() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let custom: Vec<&str> = catalog
        .custom_object_streams()
        .iter()
        .map(|s| s.stream.as_str())
        .collect();
    assert_eq!(custom, vec!["widgets"]);
    assert_eq!(
        catalog.get_stream("widgets").unwrap().custom_object_id(),
        Some("12")
    );
}

#[test]
fn test_require_stream_missing() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let err = catalog.require_stream("nope").unwrap_err();
    assert!(matches!(err, crate::Error::StreamNotFound { .. }));
}

#[test]
fn test_field_metadata_iteration() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let contacts = catalog.get_stream("contacts").unwrap();
    let names: Vec<&str> = contacts.fields().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Id", "EmailAddress"]);
}

#[test]
fn test_field_inclusion_rules() {
    let automatic = FieldMetadata {
        inclusion: Some(Inclusion::Automatic),
        selected: Some(false),
        ..Default::default()
    };
    let unflagged = FieldMetadata::default();
    let deselected = FieldMetadata {
        selected: Some(false),
        ..Default::default()
    };
    let unsupported = FieldMetadata {
        inclusion: Some(Inclusion::Unsupported),
        selected: Some(true),
        ..Default::default()
    };

    assert!(automatic.is_included());
    assert!(unflagged.is_included());
    assert!(!deselected.is_included());
    assert!(!unsupported.is_included());
}

#[test]
fn test_unknown_metadata_keys_round_trip() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let out = serde_json::to_value(&catalog).unwrap();
    assert_eq!(
        out["streams"][0]["metadata"][2]["metadata"]["selected-by-default"],
        json!(true)
    );
    assert!(out["streams"][0]["metadata"][2]["metadata"]
        .get("selected")
        .is_none());
}

#[test]
fn test_root_metadata_mut_inserts_root() {
    let mut entry = CatalogEntry::new("forms", json!({"type": "object"}), vec!["id".into()]);
    assert!(entry.root_metadata().is_none());
    assert!(!entry.is_selected());

    entry.root_metadata_mut().selected = Some(true);
    assert!(entry.is_selected());
    assert!(entry.metadata[0].is_root());
}

#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, CATALOG).unwrap();

    let catalog = Catalog::from_file(&path).unwrap();
    assert_eq!(catalog.len(), 3);

    let err = Catalog::from_file(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, crate::Error::Config { .. }));
}
