//! Bulk export driver
//!
//! Runs one entity through the bulk API: define an export, start a sync,
//! poll it with jittered backoff until it is readable, then page through
//! the results. The bookmark moves once, after the whole drain, to the
//! largest update time seen when that is past the starting watermark.

use super::backoff::BackoffPolicy;
use super::normalize::normalize_export_row;
use super::plan::EntityDescriptor;
use super::query::{
    placeholder, ExportDefinition, ExportJob, FieldSelection, FilterExpression, JobStatus,
    SyncReference,
};
use super::types::{SyncConfig, SyncStats};
use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};
use crate::http::{ApiClient, RequestConfig};
use crate::output::MessageSink;
use crate::state::StateManager;
use crate::types::{JsonObject, JsonValue, Watermark};
use serde_json::json;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const SYNCS_PATH: &str = "/api/bulk/2.0/syncs";

/// Drives bulk export jobs for one run
pub struct BulkExportDriver<'a> {
    client: &'a dyn ApiClient,
    state: &'a StateManager,
    sink: &'a dyn MessageSink,
    config: &'a SyncConfig,
    backoff: BackoffPolicy,
}

impl<'a> BulkExportDriver<'a> {
    /// Create a driver over the run's collaborators
    pub fn new(
        client: &'a dyn ApiClient,
        state: &'a StateManager,
        sink: &'a dyn MessageSink,
        config: &'a SyncConfig,
    ) -> Self {
        Self {
            client,
            state,
            sink,
            config,
            backoff: BackoffPolicy::new(config.min_poll_interval, config.max_poll_interval),
        }
    }

    /// Export one entity end to end
    pub async fn sync(
        &self,
        entity: &EntityDescriptor,
        entry: &CatalogEntry,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let stream = entity.name();
        info!("{stream} - Starting export");

        let since = self
            .state
            .bookmark_or(stream, &self.config.start_date)
            .await?;
        let definition = self.build(entity, entry, since.clone())?;

        let timer = Instant::now();
        let mut job = self.submit(entity, &definition).await?;
        stats.add_job();
        self.poll(&mut job, stats).await?;
        self.drain(entity, entry, &job, &since, stats).await?;

        info!(
            "{stream} - export job finished in {:.1}s",
            timer.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Build the export definition for an entity
    pub fn build(
        &self,
        entity: &EntityDescriptor,
        entry: &CatalogEntry,
        since: Watermark,
    ) -> Result<ExportDefinition> {
        let mut fields = FieldSelection::from_entry(entry)?;
        let root = entry.query_language_name().ok_or_else(|| {
            Error::catalog(entity.name(), "missing tap-eloqua.query-language-name")
        })?;

        // The drain reads the update field back to advance the bookmark.
        let update_field = entity.update_field();
        if fields.get(update_field).is_none() {
            debug!("{} - adding deselected {update_field} to the export", entity.name());
            fields.insert(update_field, placeholder(root, update_field));
        }

        let mut filter = FilterExpression::since(root, entity.update_field(), since);
        if let Some(activity_type) = entity.activity_type() {
            filter = filter.with_activity_type(activity_type);
        }

        Ok(ExportDefinition::new(fields, &filter))
    }

    /// Create the export definition and start a sync for it
    ///
    /// Neither call is retried.
    pub async fn submit(
        &self,
        entity: &EntityDescriptor,
        definition: &ExportDefinition,
    ) -> Result<ExportJob> {
        let stream = entity.name();
        let export_path = entity
            .export_path()
            .ok_or_else(|| Error::catalog(stream, "not a bulk entity"))?;

        let created = self
            .client
            .post_json(
                &export_path,
                RequestConfig::new()
                    .json(serde_json::to_value(definition)?)
                    .endpoint("export_create_def"),
            )
            .await?;
        let definition_uri = required_str(&created, "uri", &export_path)?;

        let synced = self
            .client
            .post_json(
                SYNCS_PATH,
                RequestConfig::new()
                    .json(json!({ "syncedInstanceUri": definition_uri }))
                    .endpoint("export_create_sync"),
            )
            .await?;
        let sync_uri = required_str(&synced, "uri", SYNCS_PATH)?;
        let sync = SyncReference::parse(sync_uri)?;

        info!("{stream} - export {definition_uri} running as sync {}", sync.id());
        Ok(ExportJob::submitted(stream, definition_uri, sync))
    }

    /// Poll the sync until its results are readable
    pub async fn poll(&self, job: &mut ExportJob, stats: &mut SyncStats) -> Result<()> {
        let mut sleep = Duration::ZERO;
        loop {
            let body = self
                .client
                .get_json(
                    &job.sync.status_path(),
                    RequestConfig::new().endpoint("export_sync_poll"),
                )
                .await?;
            stats.add_poll();

            let status = required_str(&body, "status", &job.sync.status_path())?;
            job.status = JobStatus::parse(status);

            match job.status {
                ref ready if ready.is_ready() => {
                    info!("{} - status: {}", job.stream, job.status);
                    return Ok(());
                }
                JobStatus::Pending => {}
                ref other => return Err(Error::job_failed(&job.stream, other.as_str())),
            }

            if job.started_at.elapsed() > self.config.poll_deadline {
                return Err(Error::DeadlineExceeded {
                    stream: job.stream.clone(),
                    seconds: self.config.poll_deadline.as_secs(),
                });
            }

            sleep = self.backoff.next_interval(sleep);
            info!(
                "{} - status: {}, sleeping for {:.1}s",
                job.stream,
                job.status,
                sleep.as_secs_f64()
            );
            tokio::time::sleep(sleep).await;
        }
    }

    /// Page through the sync's results, emitting normalized rows
    ///
    /// Returns the largest update time seen, if any row carried one. The
    /// bookmark is written only when that value is past `since`.
    pub async fn drain(
        &self,
        entity: &EntityDescriptor,
        entry: &CatalogEntry,
        job: &ExportJob,
        since: &Watermark,
        stats: &mut SyncStats,
    ) -> Result<Option<Watermark>> {
        let stream = entity.name();
        let update_field = entity.update_field();
        let data_path = job.sync.data_path();
        info!("{stream} - Pulling export results - {}", job.sync.id());

        self.sink
            .write_schema(stream, &entry.schema, &entry.key_properties)?;

        let limit = self.config.bulk_page_size;
        let mut offset = 0usize;
        let mut max_seen: Option<Watermark> = None;

        loop {
            let mut page = self
                .client
                .get_json(
                    &data_path,
                    RequestConfig::new()
                        .query("limit", limit)
                        .query("offset", offset)
                        .endpoint("export_data"),
                )
                .await?;
            stats.add_page();

            let has_more = page
                .get("hasMore")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false);
            offset += limit;

            let rows = take_rows(&mut page, &data_path)?;
            debug!("{stream} - page of {} rows, hasMore={has_more}", rows.len());
            stats.add_records(rows.len());

            for row in rows {
                let row = normalize_export_row(row);
                if let Some(updated) = row_watermark(stream, &row, update_field) {
                    max_seen = max_seen.max(Some(updated));
                }
                self.sink.write_record(stream, row)?;
            }

            if !has_more {
                break;
            }
        }

        match max_seen {
            Some(ref watermark) if watermark > since => {
                self.state.write_bookmark(stream, watermark).await?;
            }
            Some(ref watermark) => {
                debug!("{stream} - {watermark} does not advance bookmark {since}");
            }
            None => {}
        }
        Ok(max_seen)
    }
}

/// Pull the `items` rows out of a data page
fn take_rows(page: &mut JsonValue, endpoint: &str) -> Result<Vec<JsonObject>> {
    match page.get_mut("items").map(JsonValue::take) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::Object(row) => Ok(row),
                other => Err(Error::unexpected(
                    endpoint,
                    format!("export row is not an object: {other}"),
                )),
            })
            .collect(),
        Some(other) => Err(Error::unexpected(
            endpoint,
            format!("items is not an array: {other}"),
        )),
    }
}

/// Update time of a row, if present and parseable
fn row_watermark(stream: &str, row: &JsonObject, update_field: &str) -> Option<Watermark> {
    let raw = match row.get(update_field) {
        Some(JsonValue::String(raw)) => raw,
        Some(JsonValue::Null) => return None,
        Some(other) => {
            warn!("{stream} - ignoring non-string {update_field}: {other}");
            return None;
        }
        None => {
            warn!("{stream} - export row is missing {update_field}");
            return None;
        }
    };
    match Watermark::parse(raw) {
        Ok(watermark) => Some(watermark),
        Err(e) => {
            warn!("{stream} - ignoring unparseable {update_field}: {e}");
            None
        }
    }
}

/// A string field every response of an endpoint must carry
fn required_str<'v>(body: &'v JsonValue, key: &str, endpoint: &str) -> Result<&'v str> {
    body.get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::unexpected(endpoint, format!("missing '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldMetadata, Inclusion, MetadataEntry};
    use crate::error::Result;
    use crate::output::MemorySink;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Replays canned responses and records the calls made
    #[derive(Default)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<JsonValue>>,
        calls: Mutex<Vec<(String, String, RequestConfig)>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<JsonValue>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn next(&self, method: &str, path: &str, request: RequestConfig) -> Result<JsonValue> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), path.to_string(), request));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Other(format!("no scripted response for {path}")))
        }

        fn calls(&self) -> Vec<(String, String, RequestConfig)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiClient for ScriptedClient {
        async fn get_json(&self, path: &str, request: RequestConfig) -> Result<JsonValue> {
            self.next("GET", path, request)
        }

        async fn post_json(&self, path: &str, request: RequestConfig) -> Result<JsonValue> {
            self.next("POST", path, request)
        }
    }

    fn contacts_entry() -> CatalogEntry {
        CatalogEntry::new("contacts", json!({"type": "object"}), vec!["id".into()]).with_metadata(
            vec![
                MetadataEntry::root(FieldMetadata {
                    selected: Some(true),
                    query_language_name: Some("Contact".into()),
                    ..Default::default()
                }),
                MetadataEntry::field(
                    "UpdatedAt",
                    FieldMetadata {
                        inclusion: Some(Inclusion::Automatic),
                        statement: Some("{{Contact.UpdatedAt}}".into()),
                        ..Default::default()
                    },
                ),
            ],
        )
    }

    fn fast_config() -> SyncConfig {
        SyncConfig::new(Watermark::parse("2019-01-01T00:00:00Z").unwrap())
            .with_bulk_page_size(2)
            .with_poll_intervals(Duration::from_millis(1), Duration::from_millis(4))
    }

    fn submitted_responses() -> Vec<JsonValue> {
        vec![
            json!({"uri": "/contacts/exports/5"}),
            json!({"uri": "/syncs/77", "status": "pending"}),
        ]
    }

    #[tokio::test]
    async fn test_build_uses_bookmark_and_activity_filter() {
        let client = ScriptedClient::default();
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let mut entry = contacts_entry();
        entry.root_metadata_mut().query_language_name = Some("Activity".into());
        let entity = EntityDescriptor::activity("EmailSend");
        let since = Watermark::parse("2020-02-03 04:05:06").unwrap();

        let definition = driver.build(&entity, &entry, since).unwrap();
        assert_eq!(
            definition.filter,
            "'{{Activity.CreatedAt}}' >= '2020-02-03 04:05:06' AND '{{Activity.Type}}' = 'EmailSend'"
        );
        assert!(definition.are_system_timestamps_in_utc);
    }

    #[tokio::test]
    async fn test_build_requires_query_language_name() {
        let client = ScriptedClient::default();
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let entry = CatalogEntry::new("contacts", json!({}), vec![]);
        let err = driver
            .build(&EntityDescriptor::built_in("contacts"), &entry, config.start_date.clone())
            .unwrap_err();
        assert!(matches!(err, Error::Catalog { .. }));
    }

    #[tokio::test]
    async fn test_submit_posts_definition_then_sync() {
        let client = ScriptedClient::new(submitted_responses());
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let entity = EntityDescriptor::built_in("contacts");
        let definition = driver
            .build(&entity, &contacts_entry(), config.start_date.clone())
            .unwrap();
        let job = driver.submit(&entity, &definition).await.unwrap();

        assert_eq!(job.sync.id(), 77);
        assert_eq!(job.definition_uri, "/contacts/exports/5");
        assert_eq!(job.status, JobStatus::Pending);

        let calls = client.calls();
        assert_eq!(calls[0].1, "/api/bulk/2.0/contacts/exports");
        assert_eq!(calls[1].1, "/api/bulk/2.0/syncs");
        assert_eq!(
            calls[1].2.body,
            Some(json!({"syncedInstanceUri": "/contacts/exports/5"}))
        );
    }

    #[tokio::test]
    async fn test_submit_malformed_sync_uri() {
        let client = ScriptedClient::new(vec![
            json!({"uri": "/contacts/exports/5"}),
            json!({"uri": "/jobs/77"}),
        ]);
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let entity = EntityDescriptor::built_in("contacts");
        let definition = driver
            .build(&entity, &contacts_entry(), config.start_date.clone())
            .unwrap();
        let err = driver.submit(&entity, &definition).await.unwrap_err();
        assert!(matches!(err, Error::MalformedJobReference { ref uri } if uri == "/jobs/77"));
    }

    #[tokio::test]
    async fn test_poll_until_success() {
        let client = ScriptedClient::new(vec![
            json!({"status": "pending"}),
            json!({"status": "pending"}),
            json!({"status": "success"}),
        ]);
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let mut job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        let mut stats = SyncStats::new();
        driver.poll(&mut job, &mut stats).await.unwrap();

        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(stats.polls, 3);
        assert!(client.calls().iter().all(|(_, path, _)| path == "/api/bulk/2.0/syncs/9"));
    }

    #[tokio::test]
    async fn test_poll_failed_status() {
        let client = ScriptedClient::new(vec![
            json!({"status": "pending"}),
            json!({"status": "failed"}),
        ]);
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let mut job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        let err = driver.poll(&mut job, &mut SyncStats::new()).await.unwrap_err();

        match err {
            Error::JobFailed { stream, status } => {
                assert_eq!(stream, "contacts");
                assert_eq!(status, "failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_deadline_exceeded() {
        let client = ScriptedClient::new(vec![json!({"status": "pending"})]);
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config().with_poll_deadline(Duration::ZERO);
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let mut job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        tokio::time::sleep(Duration::from_millis(2)).await;
        let err = driver.poll(&mut job, &mut SyncStats::new()).await.unwrap_err();

        assert!(matches!(err, Error::DeadlineExceeded { ref stream, seconds: 0 } if stream == "contacts"));
    }

    #[tokio::test]
    async fn test_drain_tracks_max_across_pages() {
        let client = ScriptedClient::new(vec![
            json!({"hasMore": true, "items": [
                {"Id": "1", "UpdatedAt": "2019-01-10 00:00:00", "Email": ""},
                {"Id": "2", "UpdatedAt": "2019-01-20 00:00:00", "Email": "a@b.c"}
            ]}),
            json!({"hasMore": false, "items": [
                {"Id": "3", "UpdatedAt": "2019-01-15 00:00:00", "Email": ""}
            ]}),
        ]);
        let sink = Arc::new(MemorySink::new());
        let state = StateManager::in_memory().with_sink(sink.clone());
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, sink.as_ref(), &config);

        let job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        let mut stats = SyncStats::new();
        let max = driver
            .drain(&EntityDescriptor::built_in("contacts"), &contacts_entry(), &job, &config.start_date, &mut stats)
            .await
            .unwrap();

        assert_eq!(max.unwrap().as_str(), "2019-01-20 00:00:00");
        assert_eq!(
            state.get_bookmark("contacts").await.as_deref(),
            Some("2019-01-20 00:00:00")
        );
        assert_eq!(stats.records_synced, 3);
        assert_eq!(stats.pages_fetched, 2);

        let records = sink.records("contacts");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["Email"], JsonValue::Null);
        assert_eq!(records[1]["Email"], "a@b.c");
        assert_eq!(sink.schema_streams(), vec!["contacts"]);
        assert_eq!(sink.states().len(), 1);

        let calls = client.calls();
        assert_eq!(calls[0].2.get_query("offset"), Some("0"));
        assert_eq!(calls[1].2.get_query("offset"), Some("2"));
        assert_eq!(calls[1].2.get_query("limit"), Some("2"));
    }

    #[tokio::test]
    async fn test_drain_without_rows_keeps_bookmark() {
        let client = ScriptedClient::new(vec![json!({"hasMore": false, "totalResults": 0})]);
        let mut seeded = crate::state::RunState::new();
        seeded.set_bookmark("contacts", "2019-06-01 00:00:00");
        let sink = Arc::new(MemorySink::new());
        let state = StateManager::with_state(seeded).with_sink(sink.clone());
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, sink.as_ref(), &config);

        let job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        let max = driver
            .drain(&EntityDescriptor::built_in("contacts"), &contacts_entry(), &job, &config.start_date, &mut SyncStats::new())
            .await
            .unwrap();

        assert!(max.is_none());
        assert_eq!(
            state.get_bookmark("contacts").await.as_deref(),
            Some("2019-06-01 00:00:00")
        );
        assert!(sink.states().is_empty());
        assert_eq!(sink.schema_streams(), vec!["contacts"]);
    }

    #[tokio::test]
    async fn test_sync_never_moves_bookmark_backwards() {
        let client = ScriptedClient::new(vec![
            json!({"uri": "/contacts/exports/5"}),
            json!({"uri": "/syncs/9"}),
            json!({"status": "success"}),
            json!({"hasMore": false, "items": [
                {"Id": "1", "UpdatedAt": "2019-01-20 00:00:00"}
            ]}),
        ]);
        let mut seeded = crate::state::RunState::new();
        seeded.set_bookmark("contacts", "2019-01-20 00:00:00.900");
        let sink = Arc::new(MemorySink::new());
        let state = StateManager::with_state(seeded).with_sink(sink.clone());
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, sink.as_ref(), &config);

        let mut stats = SyncStats::new();
        driver
            .sync(&EntityDescriptor::built_in("contacts"), &contacts_entry(), &mut stats)
            .await
            .unwrap();

        assert_eq!(stats.records_synced, 1);
        assert_eq!(
            state.get_bookmark("contacts").await.as_deref(),
            Some("2019-01-20 00:00:00.900")
        );
        assert!(sink.states().is_empty());
    }

    #[tokio::test]
    async fn test_drain_advances_past_since() {
        let client = ScriptedClient::new(vec![json!({"hasMore": false, "items": [
            {"Id": "1", "UpdatedAt": "2019-01-20 00:00:01"}
        ]})]);
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let since = Watermark::parse("2019-01-20 00:00:00.900").unwrap();
        let job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        driver
            .drain(&EntityDescriptor::built_in("contacts"), &contacts_entry(), &job, &since, &mut SyncStats::new())
            .await
            .unwrap();

        assert_eq!(
            state.get_bookmark("contacts").await.as_deref(),
            Some("2019-01-20 00:00:01")
        );
    }

    #[tokio::test]
    async fn test_build_keeps_deselected_update_field() {
        let client = ScriptedClient::default();
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let entry = CatalogEntry::new("contacts", json!({"type": "object"}), vec!["id".into()])
            .with_metadata(vec![
                MetadataEntry::root(FieldMetadata {
                    selected: Some(true),
                    query_language_name: Some("Contact".into()),
                    ..Default::default()
                }),
                MetadataEntry::field(
                    "Id",
                    FieldMetadata {
                        inclusion: Some(Inclusion::Automatic),
                        statement: Some("{{Contact.Id}}".into()),
                        ..Default::default()
                    },
                ),
                MetadataEntry::field(
                    "UpdatedAt",
                    FieldMetadata {
                        selected: Some(false),
                        inclusion: Some(Inclusion::Available),
                        statement: Some("{{Contact.UpdatedAt}}".into()),
                        ..Default::default()
                    },
                ),
            ]);

        let definition = driver
            .build(&EntityDescriptor::built_in("contacts"), &entry, config.start_date.clone())
            .unwrap();

        assert_eq!(definition.fields.get("Id"), Some("{{Contact.Id}}"));
        assert_eq!(definition.fields.get("UpdatedAt"), Some("{{Contact.UpdatedAt}}"));
        assert_eq!(definition.fields.len(), 2);
    }

    #[tokio::test]
    async fn test_build_adds_activity_created_at() {
        let client = ScriptedClient::default();
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let mut entry = contacts_entry();
        entry.root_metadata_mut().query_language_name = Some("Activity".into());
        let definition = driver
            .build(&EntityDescriptor::activity("FormSubmit"), &entry, config.start_date.clone())
            .unwrap();

        assert_eq!(
            definition.fields.get("CreatedAt"),
            Some("{{Activity.CreatedAt}}")
        );
    }

    #[tokio::test]
    async fn test_drain_rejects_non_object_rows() {
        let client = ScriptedClient::new(vec![json!({"hasMore": false, "items": [1, 2]})]);
        let state = StateManager::in_memory();
        let sink = MemorySink::new();
        let config = fast_config();
        let driver = BulkExportDriver::new(&client, &state, &sink, &config);

        let job = ExportJob::submitted("contacts", "/contacts/exports/5", SyncReference::parse("/syncs/9").unwrap());
        let err = driver
            .drain(&EntityDescriptor::built_in("contacts"), &contacts_entry(), &job, &config.start_date, &mut SyncStats::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
    }
}
