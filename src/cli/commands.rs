//! CLI commands and argument parsing

use clap::Parser;
use std::path::PathBuf;

/// Incremental Eloqua extractor emitting Singer messages
#[derive(Parser, Debug)]
#[command(name = "tap-eloqua")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// State file from a previous run (JSON)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Catalog file with stream selection (JSON)
    #[arg(long, conflicts_with = "discover")]
    pub catalog: Option<PathBuf>,

    /// Print the discovered catalog and exit
    #[arg(short, long)]
    pub discover: bool,

    /// Rewrite this file with the latest state after every checkpoint
    #[arg(long)]
    pub state_output: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// What the invocation asks for
    pub fn mode(&self) -> Mode {
        if self.discover {
            Mode::Discover
        } else {
            Mode::Sync
        }
    }
}

/// Top-level mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Discover the catalog
    Discover,
    /// Sync the selected streams
    Sync,
}
