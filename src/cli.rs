//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `segue` binary.
//!
//! ## Commands
//!
//! - `build`: ingest a playlist CSV export into a graph store
//! - `related`: query related tracks for one or more seed track ids
//! - `completions`: generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! segue build --csv-path data/songs.csv
//! segue related 4uLU6hMCjMI75M1A2tKUQC
//! segue related seed_a seed_b --max-hops 2 -k 10
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Which graph store implementation to use.
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum StoreKind {
    /// Persistent SQLite database (default).
    Sqlite,
    /// In-process store, rebuilt from the CSV on every invocation.
    Memory,
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "segue")]
#[command(about = "Segue: playlist co-occurrence graphs & related-track retrieval")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Build the co-occurrence graph from a playlist CSV export
    ///
    /// Reads rows of (track_id, playlist_id) plus optional descriptive
    /// columns, and writes one node per track and one weighted edge per
    /// pair of tracks sharing a playlist.
    Build {
        /// Path to the playlist/track CSV export
        #[arg(long)]
        csv_path: PathBuf,

        /// Graph store to populate
        #[arg(long, value_enum, default_value_t = StoreKind::Sqlite)]
        store: StoreKind,

        /// Database file for the sqlite store (defaults to the platform
        /// data directory)
        #[arg(long, env = "SEGUE_DB_PATH")]
        db_path: Option<PathBuf>,

        /// Write the built graph as JSON (memory store only)
        #[arg(long)]
        export_json: Option<PathBuf>,
    },

    /// Query related tracks for one or more seed track ids
    ///
    /// A single seed lists its ranked neighbors directly. Several seeds
    /// run the multi-seed engine: tracks reachable from every seed within
    /// the hop bound, ranked by total hops, then total weight, then id.
    Related {
        /// Seed track ids (one or more)
        #[arg(required = true)]
        seeds: Vec<String>,

        /// Limit the number of related tracks returned
        #[arg(short = 'k', long = "limit", allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Maximum hop distance when searching for shared tracks (>= 1)
        #[arg(long, default_value_t = 1)]
        max_hops: u32,

        /// Graph store to query
        #[arg(long, value_enum, default_value_t = StoreKind::Sqlite)]
        store: StoreKind,

        /// Database file for the sqlite store (defaults to the platform
        /// data directory)
        #[arg(long, env = "SEGUE_DB_PATH")]
        db_path: Option<PathBuf>,

        /// CSV export to build the graph from before querying.
        /// Required for the memory store.
        #[arg(long)]
        csv_path: Option<PathBuf>,

        /// Rebuild the sqlite store from --csv-path before querying
        #[arg(long, requires = "csv_path")]
        rebuild: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}
