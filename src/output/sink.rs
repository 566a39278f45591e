//! Message sinks
//!
//! The engine writes every message through a `MessageSink`. Writes are
//! synchronous and ordered; a sink must have fully accepted a message
//! before the call returns.

use super::types::Message;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use std::io::{Stdout, Write};
use std::sync::{Arc, Mutex};

/// Destination for Singer messages
pub trait MessageSink: Send + Sync {
    /// Write a single message
    fn write_message(&self, message: &Message) -> Result<()>;

    /// Write a stream's schema
    fn write_schema(&self, stream: &str, schema: &JsonValue, key_properties: &[String]) -> Result<()> {
        self.write_message(&Message::schema(
            stream,
            schema.clone(),
            key_properties.to_vec(),
        ))
    }

    /// Write one record
    fn write_record(&self, stream: &str, record: JsonObject) -> Result<()> {
        self.write_message(&Message::record(stream, record))
    }

    /// Write a state checkpoint
    fn write_state(&self, value: &JsonValue) -> Result<()> {
        self.write_message(&Message::state(value.clone()))
    }
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn MessageSink>;

// ============================================================================
// JSON Lines
// ============================================================================

/// Writes each message as one line of JSON and flushes after every line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<Stdout> {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink over any writer
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|_| Error::output("writer lock poisoned"))
    }
}

impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    fn write_message(&self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::output("writer lock poisoned"))?;
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<Message>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages written so far, in order
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Records written for one stream, in order
    pub fn records(&self, stream: &str) -> Vec<JsonObject> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// State blobs written so far, in order
    pub fn states(&self) -> Vec<JsonValue> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Names of streams that had a schema written, in order
    pub fn schema_streams(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream),
                _ => None,
            })
            .collect()
    }
}

impl MessageSink for MemorySink {
    fn write_message(&self, message: &Message) -> Result<()> {
        self.messages
            .lock()
            .map_err(|_| Error::output("sink lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
