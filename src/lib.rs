//! # tap-eloqua
//!
//! Incremental extractor for the Oracle Eloqua marketing platform. Records
//! are written to stdout as Singer SCHEMA / RECORD / STATE messages.
//!
//! ## Features
//!
//! - **Bulk exports**: contacts, accounts, custom objects and activities are
//!   pulled through asynchronous export jobs (define, sync, poll, drain)
//! - **Paged REST**: visitors and assets are listed page by page
//! - **Incremental sync**: per-stream bookmarks, checkpointed after every
//!   stream and resumable from the last stream in progress
//! - **OAuth2**: refresh-token auth with base URL discovery
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tap_eloqua::{Catalog, HttpClient, JsonLinesSink, Orchestrator, StateManager, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_eloqua::Result<()> {
//!     let config = TapConfig::from_file("config.json")?;
//!     let catalog = Catalog::from_file("catalog.json")?;
//!     let client = HttpClient::with_auth(config.http_config(), config.auth_config())?;
//!
//!     let mut orchestrator = Orchestrator::new(
//!         Arc::new(client),
//!         StateManager::from_file("state.json")?,
//!         Arc::new(JsonLinesSink::stdout()),
//!         config.sync_config()?,
//!     );
//!     let stats = orchestrator.run(&catalog).await?;
//!     println!("{} records", stats.records_synced);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Orchestrator                           │
//! │  EntityPlan → schedule(selected, resume) → per-stream sync      │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │  Bulk export  │   Paged   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ OAuth2   │ GET/POST  │ Define + Sync │ page/count│ SCHEMA      │
//! │ Base URL │ Retry     │ Poll (jitter) │ search    │ RECORD      │
//! │          │ Rate Limit│ Drain pages   │ bookmark  │ STATE       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// OAuth2 authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Catalog and stream selection metadata
pub mod catalog;

/// Catalog discovery against the Eloqua API
pub mod discover;

/// Bookmark state and checkpointing
pub mod state;

/// Singer message output
pub mod output;

/// Bulk export driver, paged fetcher and orchestrator
pub mod engine;

/// Tap configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::{Catalog, CatalogEntry};
pub use config::TapConfig;
pub use engine::{Orchestrator, SyncConfig, SyncStats};
pub use error::{Error, Result};
pub use http::{ApiClient, HttpClient};
pub use output::{JsonLinesSink, MessageSink};
pub use state::StateManager;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
