//! Output module
//!
//! Singer message model and the sinks messages are written to.
//!
//! # Overview
//!
//! This module provides:
//! - `Message` - `SCHEMA`, `RECORD` and `STATE` messages
//! - `MessageSink` - the emission interface used by the engine
//! - `JsonLinesSink` - one JSON message per line (stdout in the CLI)
//! - `MemorySink` - collects messages in memory for embedding and tests

mod sink;
mod types;

pub use sink::{JsonLinesSink, MemorySink, MessageSink, SharedSink};
pub use types::Message;
