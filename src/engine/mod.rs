//! Execution engine module
//!
//! Walks the entity plan and syncs each entity through the bulk export
//! driver or the paged REST fetcher.
//!
//! # Overview
//!
//! The engine module provides:
//! - `Orchestrator` - runs the plan with resume and state management
//! - `BulkExportDriver` - define, submit, poll and drain an export job
//! - `PagedFetcher` - page a REST listing since a watermark
//! - `EntityPlan` - ordered entities and the resume rule
//! - `SyncConfig` - page sizes, poll bounds and deadline for a run

mod backoff;
mod bulk;
mod normalize;
mod paged;
mod plan;
mod query;
mod types;

pub use backoff::BackoffPolicy;
pub use bulk::BulkExportDriver;
pub use normalize::normalize_export_row;
pub use paged::PagedFetcher;
pub use plan::{
    activity_type_to_stream, camel_to_snake, EntityDescriptor, EntityPlan, ACTIVITY_TYPES,
    BUILT_IN_BULK_OBJECTS, SIMPLE_ASSETS,
};
pub use query::{
    placeholder, ExportDefinition, ExportJob, FieldSelection, FilterExpression, JobStatus,
    SyncReference,
};
pub use types::{
    SyncConfig, SyncStats, DEFAULT_BULK_PAGE_SIZE, DEFAULT_MAX_POLL_INTERVAL,
    DEFAULT_MIN_POLL_INTERVAL, DEFAULT_POLL_DEADLINE, DEFAULT_REST_PAGE_SIZE,
};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::http::ApiClient;
use crate::output::SharedSink;
use crate::state::StateManager;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs a full sync over the entity plan
pub struct Orchestrator {
    /// API transport
    client: Arc<dyn ApiClient>,
    /// Run state and bookmarks
    state: StateManager,
    /// Message output
    sink: SharedSink,
    /// Sync configuration
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl Orchestrator {
    /// Create an orchestrator; state checkpoints go to the same sink as records
    pub fn new(
        client: Arc<dyn ApiClient>,
        state: StateManager,
        sink: SharedSink,
        config: SyncConfig,
    ) -> Self {
        Self {
            client,
            state: state.with_sink(sink.clone()),
            sink,
            config,
            stats: SyncStats::default(),
        }
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every entity due this run
    ///
    /// `current_stream` is set before each entity starts and cleared once
    /// the whole plan has finished, so an interrupted run resumes at the
    /// entity it was working on.
    pub async fn run(&mut self, catalog: &Catalog) -> Result<SyncStats> {
        let start = Instant::now();

        let selected = catalog.selected_streams();
        if selected.is_empty() {
            info!("No streams selected, nothing to sync");
            return Ok(self.stats.clone());
        }

        let plan = EntityPlan::build(catalog);
        let resume_from = self.state.current_stream().await;
        if let Some(ref stream) = resume_from {
            info!("Resuming interrupted sync at {stream}");
        }
        let scheduled = plan.schedule(&selected, resume_from.as_deref());
        info!(
            "Syncing {} of {} planned streams",
            scheduled.len(),
            plan.len()
        );

        let bulk = BulkExportDriver::new(
            self.client.as_ref(),
            &self.state,
            self.sink.as_ref(),
            &self.config,
        );
        let paged = PagedFetcher::new(
            self.client.as_ref(),
            &self.state,
            self.sink.as_ref(),
            &self.config,
        );

        for entity in scheduled {
            let stream = entity.name();
            let entry = catalog.require_stream(stream)?;
            self.state.set_current_stream(Some(stream)).await?;

            let records_before = self.stats.records_synced;
            if entity.is_bulk() {
                bulk.sync(entity, entry, &mut self.stats).await?;
            } else {
                paged.sync(entity, entry, &mut self.stats).await?;
            }
            self.stats.add_stream();

            info!(
                "{stream} - synced {} records",
                self.stats.records_synced - records_before
            );
        }

        self.state.set_current_stream(None).await?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Sync complete: {} streams, {} records in {}ms",
            self.stats.streams_synced, self.stats.records_synced, self.stats.duration_ms
        );
        Ok(self.stats.clone())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
