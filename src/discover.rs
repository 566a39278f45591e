//! Catalog discovery
//!
//! Builds the catalog from the bulk API field listings (built-in objects,
//! activity types and custom objects) plus fixed schemas for the REST
//! listed entities.

use crate::catalog::{Catalog, CatalogEntry, FieldMetadata, Inclusion, MetadataEntry};
use crate::engine::{
    activity_type_to_stream, placeholder, ACTIVITY_TYPES, BUILT_IN_BULK_OBJECTS, SIMPLE_ASSETS,
};
use crate::error::{Error, Result};
use crate::http::{ApiClient, RequestConfig};
use crate::types::{JsonObject, JsonValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const LISTING_PAGE_SIZE: usize = 1000;

static FIELD_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*/fields/([0-9]+)").expect("field uri pattern compiles"));
static CUSTOM_OBJECT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/customObjects/([0-9]+)").expect("custom object uri pattern compiles")
});

/// A field from a bulk `/fields` listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkField {
    internal_name: String,
    #[serde(default)]
    data_type: String,
    statement: String,
    #[serde(default)]
    uri: Option<String>,
}

/// A custom object from `/customObjects`
#[derive(Debug, Clone, Deserialize)]
struct CustomObject {
    name: String,
    uri: String,
}

/// JSON schema for a bulk field data type
fn json_type(data_type: &str) -> JsonValue {
    match data_type {
        "date" => json!({"type": ["null", "string"], "format": "date-time"}),
        "number" => json!({"type": ["null", "number"]}),
        _ => json!({"type": ["null", "string"]}),
    }
}

/// Stream name for a custom object display name
pub fn custom_object_stream_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Discover every stream
pub async fn discover(client: &dyn ApiClient) -> Result<Catalog> {
    info!("Starting discover");
    let mut streams = Vec::new();

    for object in BUILT_IN_BULK_OBJECTS {
        let root = match object {
            "accounts" => "Account",
            _ => "Contact",
        };
        let fields = list_items::<BulkField>(client, &format!("/api/bulk/2.0/{object}/fields"), &[]).await?;
        streams.push(bulk_entry(object, root, None, "id", "UpdatedAt", fields));
    }

    for activity_type in ACTIVITY_TYPES {
        let fields = list_items::<BulkField>(
            client,
            "/api/bulk/2.0/activities/fields",
            &[("activityType", activity_type)],
        )
        .await?;
        streams.push(bulk_entry(
            &activity_type_to_stream(activity_type),
            "Activity",
            None,
            "Id",
            "CreatedAt",
            fields,
        ));
    }

    for object in list_items::<CustomObject>(client, "/api/bulk/2.0/customObjects", &[]).await? {
        let id = CUSTOM_OBJECT_ID
            .captures(&object.uri)
            .map(|c| c[1].to_string())
            .ok_or_else(|| {
                Error::unexpected(
                    "/api/bulk/2.0/customObjects",
                    format!("bad custom object uri {}", object.uri),
                )
            })?;
        let stream = custom_object_stream_name(&object.name);
        let fields = list_items::<BulkField>(
            client,
            &format!("/api/bulk/2.0/customObjects/{id}/fields"),
            &[],
        )
        .await?;
        streams.push(bulk_entry(
            &stream,
            &format!("CustomObject[{id}]"),
            Some(&id),
            "id",
            "UpdatedAt",
            fields,
        ));
    }

    for (name, _, update_field) in SIMPLE_ASSETS {
        streams.push(asset_entry(name, update_field));
    }

    info!("Finished discover: {} streams", streams.len());
    Ok(Catalog { streams })
}

/// Read every item of a bulk listing, following `hasMore`
async fn list_items<T: for<'de> Deserialize<'de>>(
    client: &dyn ApiClient,
    path: &str,
    extra: &[(&str, &str)],
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut offset = 0usize;
    loop {
        let mut request = RequestConfig::new()
            .query("limit", LISTING_PAGE_SIZE)
            .query("offset", offset)
            .endpoint("bulk_fields");
        for (key, value) in extra {
            request = request.query(*key, value);
        }

        let mut page = client.get_json(path, request).await?;
        let has_more = page
            .get("hasMore")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        let batch = match page.get_mut("items").map(JsonValue::take) {
            Some(value @ JsonValue::Array(_)) => serde_json::from_value::<Vec<T>>(value)?,
            _ => Vec::new(),
        };
        debug!("{path} - {} items at offset {offset}", batch.len());

        let fetched = batch.len();
        items.extend(batch);
        if !has_more || fetched == 0 {
            break;
        }
        offset += fetched;
    }
    Ok(items)
}

/// Catalog entry for a bulk stream
///
/// The key field and update field are always exported; they are added
/// with their root statements when the field listing lacks them.
fn bulk_entry(
    stream: &str,
    root: &str,
    custom_object_id: Option<&str>,
    key_field: &str,
    update_field: &str,
    fields: Vec<BulkField>,
) -> CatalogEntry {
    let mut properties = JsonObject::new();
    let mut metadata = vec![MetadataEntry::root(FieldMetadata {
        id: custom_object_id.map(str::to_string),
        query_language_name: Some(root.to_string()),
        table_key_properties: Some(vec![key_field.to_string()]),
        ..Default::default()
    })];

    for field in fields {
        let field_id = field
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .and_then(|uri| FIELD_ID.captures(uri))
            .map(|c| c[1].to_string());
        let inclusion = if field.internal_name == update_field || field.internal_name == key_field {
            Inclusion::Automatic
        } else {
            Inclusion::Available
        };

        properties.insert(field.internal_name.clone(), json_type(&field.data_type));
        metadata.push(MetadataEntry::field(
            field.internal_name,
            FieldMetadata {
                inclusion: Some(inclusion),
                statement: Some(field.statement),
                id: field_id,
                ..Default::default()
            },
        ));
    }

    for (name, source, data_type) in [(key_field, "Id", "string"), (update_field, update_field, "date")] {
        if properties.contains_key(name) {
            continue;
        }
        properties.insert(name.to_string(), json_type(data_type));
        metadata.push(MetadataEntry::field(
            name,
            FieldMetadata {
                inclusion: Some(Inclusion::Automatic),
                statement: Some(placeholder(root, source)),
                ..Default::default()
            },
        ));
    }

    CatalogEntry::new(
        stream,
        json!({"type": "object", "properties": properties}),
        vec![key_field.to_string()],
    )
    .with_metadata(metadata)
}

/// Catalog entry for a REST listed entity
fn asset_entry(name: &str, update_field: &str) -> CatalogEntry {
    let properties = if name == "visitors" {
        json!({
            "visitorId": {"type": ["null", "string"]},
            "contactId": {"type": ["null", "string"]},
            "currentStatus": {"type": ["null", "string"]},
            "externalId": {"type": ["null", "string"]},
            "V_IPAddress": {"type": ["null", "string"]},
            "v_LastVisitDateAndTime": {"type": ["null", "integer"]},
            "V_Time_Zone": {"type": ["null", "string"]},
            "createdAt": {"type": ["null", "string"]}
        })
    } else {
        json!({
            "id": {"type": ["null", "string"]},
            "type": {"type": ["null", "string"]},
            "name": {"type": ["null", "string"]},
            "description": {"type": ["null", "string"]},
            "folderId": {"type": ["null", "string"]},
            "createdAt": {"type": ["null", "string"]},
            "createdBy": {"type": ["null", "string"]},
            "updatedAt": {"type": ["null", "string"]},
            "updatedBy": {"type": ["null", "string"]},
            "currentStatus": {"type": ["null", "string"]},
            "depth": {"type": ["null", "string"]}
        })
    };
    let key = if name == "visitors" { "visitorId" } else { "id" };

    let mut metadata = vec![MetadataEntry::root(FieldMetadata {
        table_key_properties: Some(vec![key.to_string()]),
        ..Default::default()
    })];
    if let Some(props) = properties.as_object() {
        for field in props.keys() {
            let inclusion = if field == update_field || field == key {
                Inclusion::Automatic
            } else {
                Inclusion::Available
            };
            metadata.push(MetadataEntry::field(
                field.as_str(),
                FieldMetadata {
                    inclusion: Some(inclusion),
                    ..Default::default()
                },
            ));
        }
    }

    CatalogEntry::new(
        name,
        json!({"type": "object", "properties": properties}),
        vec![key.to_string()],
    )
    .with_metadata(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpClientConfig};
    use pretty_assertions::assert_eq;
    use test_case::test_case;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn field(name: &str, data_type: &str, statement: &str, uri: &str) -> JsonValue {
        json!({"internalName": name, "dataType": data_type, "statement": statement, "uri": uri})
    }

    async fn mount_listings(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/bulk/2.0/contacts/fields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    field("C_EmailAddress", "emailAddress", "{{Contact.Field(C_EmailAddress)}}", "/contacts/fields/100001"),
                    field("C_DateModified", "date", "{{Contact.Field(C_DateModified)}}", "/contacts/fields/100002")
                ],
                "hasMore": false
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/bulk/2.0/accounts/fields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [field("M_CompanyName", "text", "{{Account.Field(M_CompanyName)}}", "")],
                "hasMore": false
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/bulk/2.0/activities/fields"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    field("Id", "number", "{{Activity.Id}}", ""),
                    field("CreatedAt", "date", "{{Activity.CreatedAt}}", "")
                ],
                "hasMore": false
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/bulk/2.0/customObjects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": " Event Registration-2019 ", "uri": "/customObjects/8"}],
                "hasMore": false
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/bulk/2\.0/customObjects/8/fields$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [field("Seat", "number", "{{CustomObject[8].Field[431]}}", "/customObjects/8/fields/431")],
                "hasMore": false
            })))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> HttpClient {
        HttpClient::with_config(
            HttpClientConfig::builder()
                .base_url(server.uri())
                .no_rate_limit()
                .build(),
        )
        .unwrap()
    }

    #[test_case("Event Registration", "event_registration")]
    #[test_case("  Webinar-Signups ", "webinar_signups")]
    #[test_case("LEADS", "leads")]
    fn test_custom_object_stream_name(input: &str, expected: &str) {
        assert_eq!(custom_object_stream_name(input), expected);
    }

    #[test]
    fn test_json_type_mapping() {
        assert_eq!(json_type("date")["format"], "date-time");
        assert_eq!(json_type("number")["type"], json!(["null", "number"]));
        assert_eq!(json_type("emailAddress")["type"], json!(["null", "string"]));
    }

    #[tokio::test]
    async fn test_discover_builds_full_catalog() {
        let server = MockServer::start().await;
        mount_listings(&server).await;

        let catalog = discover(&client(&server)).await.unwrap();

        let names: Vec<&str> = catalog.streams.iter().map(|s| s.stream.as_str()).collect();
        assert_eq!(names.len(), 2 + ACTIVITY_TYPES.len() + 1 + 4);
        assert_eq!(&names[..2], &["accounts", "contacts"]);
        assert!(names.contains(&"activity_email_open"));
        assert!(names.contains(&"event_registration_2019"));
        assert_eq!(&names[names.len() - 4..], &["visitors", "campaigns", "emails", "forms"]);
    }

    #[tokio::test]
    async fn test_discover_contact_metadata() {
        let server = MockServer::start().await;
        mount_listings(&server).await;

        let catalog = discover(&client(&server)).await.unwrap();
        let contacts = catalog.get_stream("contacts").unwrap();

        assert_eq!(contacts.key_properties, vec!["id"]);
        assert_eq!(contacts.query_language_name(), Some("Contact"));
        assert_eq!(contacts.custom_object_id(), None);
        assert_eq!(contacts.schema["properties"]["C_DateModified"]["format"], "date-time");

        let fields: Vec<(&str, Option<&str>)> = contacts
            .fields()
            .map(|(name, meta)| (name, meta.id.as_deref()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("C_EmailAddress", Some("100001")),
                ("C_DateModified", Some("100002")),
                ("id", None),
                ("UpdatedAt", None),
            ]
        );

        let (_, updated) = contacts.fields().find(|(n, _)| *n == "UpdatedAt").unwrap();
        assert_eq!(updated.inclusion, Some(Inclusion::Automatic));
        assert_eq!(updated.statement.as_deref(), Some("{{Contact.UpdatedAt}}"));
    }

    #[tokio::test]
    async fn test_discover_activity_and_custom_object() {
        let server = MockServer::start().await;
        mount_listings(&server).await;

        let catalog = discover(&client(&server)).await.unwrap();

        let open = catalog.get_stream("activity_email_open").unwrap();
        assert_eq!(open.key_properties, vec!["Id"]);
        assert_eq!(open.query_language_name(), Some("Activity"));
        let automatic: Vec<&str> = open
            .fields()
            .filter(|(_, m)| m.inclusion == Some(Inclusion::Automatic))
            .map(|(n, _)| n)
            .collect();
        assert_eq!(automatic, vec!["Id", "CreatedAt"]);

        let custom = catalog.get_stream("event_registration_2019").unwrap();
        assert_eq!(custom.custom_object_id(), Some("8"));
        assert_eq!(custom.query_language_name(), Some("CustomObject[8]"));
        let (_, seat) = custom.fields().find(|(n, _)| *n == "Seat").unwrap();
        assert_eq!(seat.id.as_deref(), Some("431"));
    }

    #[tokio::test]
    async fn test_list_items_follows_has_more() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bulk/2.0/customObjects"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "a", "uri": "/customObjects/1"}],
                "hasMore": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/bulk/2.0/customObjects"))
            .and(query_param("offset", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "b", "uri": "/customObjects/2"}],
                "hasMore": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let objects = list_items::<CustomObject>(&client(&server), "/api/bulk/2.0/customObjects", &[])
            .await
            .unwrap();
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_asset_entries() {
        let visitors = asset_entry("visitors", "v_LastVisitDateAndTime");
        assert_eq!(visitors.key_properties, vec!["visitorId"]);
        assert!(visitors.custom_object_id().is_none());

        let emails = asset_entry("emails", "updatedAt");
        assert_eq!(emails.key_properties, vec!["id"]);
        let (_, updated) = emails.fields().find(|(n, _)| *n == "updatedAt").unwrap();
        assert_eq!(updated.inclusion, Some(Inclusion::Automatic));
    }
}
