//! State management module
//!
//! Handles bookmarks and the resume pointer. State is flushed after every
//! mutation so a crash leaves it consistent with the last completed step.
//!
//! # Overview
//!
//! The state module provides:
//! - `RunState` - `current_stream` plus per-stream bookmarks
//! - `StateManager` - the bookmark store, with STATE emission and file persistence

mod manager;
mod types;

pub use manager::StateManager;
pub use types::RunState;
