//! State manager implementation
//!
//! Owns the run state, and flushes it after every mutation: a STATE
//! message to the sink and, when a path is configured, an atomic write
//! of the state file.

use super::types::RunState;
use crate::error::{Error, Result};
use crate::output::SharedSink;
use crate::types::Watermark;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Bookmark store and persistence for `RunState`
pub struct StateManager {
    /// Path to the state file (None = no file persistence)
    path: Option<PathBuf>,
    /// Current state
    state: Arc<RwLock<RunState>>,
    /// Where STATE messages go
    sink: Option<SharedSink>,
}

impl StateManager {
    /// Create a state manager that persists to the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            state: Arc::new(RwLock::new(RunState::new())),
            sink: None,
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(RunState::new())
    }

    /// Create an in-memory state manager seeded with a state
    pub fn with_state(state: RunState) -> Self {
        Self {
            path: None,
            state: Arc::new(RwLock::new(state)),
            sink: None,
        }
    }

    /// Load state from a file if it exists
    ///
    /// The file is only read; use `persist_to` to also write it back.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| Error::State {
                message: format!("Failed to read state file: {e}"),
            })?;
            parse_state(&contents)?
        } else {
            RunState::new()
        };

        Ok(Self::with_state(state))
    }

    /// Create a state manager from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(parse_state(json)?))
    }

    /// Write the state file on every flush
    #[must_use]
    pub fn persist_to(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Emit a STATE message on every flush
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> RunState {
        self.state.read().await.clone()
    }

    /// Stream recorded as in progress
    pub async fn current_stream(&self) -> Option<String> {
        self.state.read().await.current_stream.clone()
    }

    /// Record the stream in progress (or `None` once the plan is done) and flush
    pub async fn set_current_stream(&self, stream: Option<&str>) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.current_stream = stream.map(String::from);
        }
        self.flush().await
    }

    /// Raw bookmark for a stream
    pub async fn get_bookmark(&self, stream: &str) -> Option<String> {
        let state = self.state.read().await;
        state.get_bookmark(stream).map(ToString::to_string)
    }

    /// Parsed bookmark for a stream, falling back to `default`
    pub async fn bookmark_or(&self, stream: &str, default: &Watermark) -> Result<Watermark> {
        match self.get_bookmark(stream).await {
            Some(raw) => Watermark::parse(raw),
            None => Ok(default.clone()),
        }
    }

    /// Store a stream's watermark and flush
    pub async fn write_bookmark(&self, stream: &str, watermark: &Watermark) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.set_bookmark(stream, watermark.as_str());
        }
        debug!("{stream} - bookmark {watermark}");
        self.flush().await
    }

    /// Emit the state and write the state file, if configured
    pub async fn flush(&self) -> Result<()> {
        let state = self.state.read().await;
        let value = serde_json::to_value(&*state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })?;

        if let Some(sink) = &self.sink {
            sink.write_state(&value)?;
        }

        if let Some(path) = &self.path {
            let contents = serde_json::to_string_pretty(&value).map_err(|e| Error::State {
                message: format!("Failed to serialize state: {e}"),
            })?;
            write_atomic(path, &contents).await?;
        }

        Ok(())
    }

    /// Export state as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// Get the state file path
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
            sink: self.sink.clone(),
        }
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("path", &self.path)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

fn parse_state(json: &str) -> Result<RunState> {
    if json.trim().is_empty() {
        return Ok(RunState::new());
    }
    serde_json::from_str(json).map_err(|e| Error::State {
        message: format!("Failed to parse state JSON: {e}"),
    })
}

/// Write to a temp file first, then rename over the target
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, contents)
        .await
        .map_err(|e| Error::State {
            message: format!("Failed to write state file: {e}"),
        })?;

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::State {
            message: format!("Failed to rename state file: {e}"),
        })?;

    Ok(())
}
