//! Engine types
//!
//! Configuration and statistics for the sync engine.

use crate::types::Watermark;
use std::time::Duration;

/// Rows requested per bulk export data page
pub const DEFAULT_BULK_PAGE_SIZE: usize = 50_000;

/// Records requested per REST page
pub const DEFAULT_REST_PAGE_SIZE: usize = 1_000;

/// First poll sleep
pub const DEFAULT_MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Longest single poll sleep
pub const DEFAULT_MAX_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Wall time an export job may take before the run gives up
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(3600);

/// Configuration for a sync run
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Watermark used for streams without a bookmark
    pub start_date: Watermark,
    /// Bulk export data page size (`limit`)
    pub bulk_page_size: usize,
    /// REST page size (`count`)
    pub rest_page_size: usize,
    /// First poll sleep
    pub min_poll_interval: Duration,
    /// Poll sleep ceiling
    pub max_poll_interval: Duration,
    /// Export job deadline measured from submission
    pub poll_deadline: Duration,
}

impl SyncConfig {
    /// Create a sync config with default limits
    pub fn new(start_date: Watermark) -> Self {
        Self {
            start_date,
            bulk_page_size: DEFAULT_BULK_PAGE_SIZE,
            rest_page_size: DEFAULT_REST_PAGE_SIZE,
            min_poll_interval: DEFAULT_MIN_POLL_INTERVAL,
            max_poll_interval: DEFAULT_MAX_POLL_INTERVAL,
            poll_deadline: DEFAULT_POLL_DEADLINE,
        }
    }

    /// Set bulk page size
    #[must_use]
    pub fn with_bulk_page_size(mut self, size: usize) -> Self {
        self.bulk_page_size = size.max(1);
        self
    }

    /// Set REST page size
    #[must_use]
    pub fn with_rest_page_size(mut self, size: usize) -> Self {
        self.rest_page_size = size.max(1);
        self
    }

    /// Set poll interval bounds
    #[must_use]
    pub fn with_poll_intervals(mut self, min: Duration, max: Duration) -> Self {
        self.min_poll_interval = min;
        self.max_poll_interval = max.max(min);
        self
    }

    /// Set the export deadline
    #[must_use]
    pub fn with_poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = deadline;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Export jobs run
    pub jobs_run: usize,
    /// Status polls issued
    pub polls: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add an export job
    pub fn add_job(&mut self) {
        self.jobs_run += 1;
    }

    /// Add a poll
    pub fn add_poll(&mut self) {
        self.polls += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
