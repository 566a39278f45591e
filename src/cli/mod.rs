//! CLI module
//!
//! Singer-style command line: `--discover` prints the catalog, otherwise
//! the streams selected in `--catalog` are synced to stdout.

mod commands;
mod runner;

pub use commands::{Cli, Mode};
pub use runner::Runner;
