//! Playlist co-occurrence graphs and related-track retrieval.
//!
//! Core modules:
//! - [`retrieval`] - Single- and multi-seed related-track queries (the engine)
//! - [`store`] - The [`store::GraphStore`] contract and the in-memory store
//! - [`db`] - Persistent SQLite graph store
//! - [`builder`] - CSV ingestion into any graph store
//!
//! ### Supporting Modules
//!
//! - [`track`] - Typed descriptive attributes carried on track nodes
//! - [`config`] - Data directory and default database location
//! - [`cli`] - Command-line interface definitions with clap integration
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use segue::{builder, retrieval};
//! use segue::store::MemoryGraphStore;
//! use std::path::Path;
//!
//! // Build the graph from a playlist CSV export.
//! let mut store = MemoryGraphStore::new();
//! builder::build_track_graph_from_csv(Path::new("songs.csv"), &mut store)?;
//!
//! // Direct neighbors of one track, strongest connections first.
//! let neighbors = retrieval::related_tracks("seed_track", &store, Some(10))?;
//!
//! // Tracks shared between two seeds within two hops, with provenance.
//! let seeds = vec!["seed_a".to_string(), "seed_b".to_string()];
//! let shared = retrieval::related_tracks_for_multiple_details(&seeds, &store, None, 2)?;
//! for detail in &shared {
//!     println!("{} (hops={}, weight={})", detail.track_id, detail.total_hops, detail.total_weight);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Ranking
//!
//! The multi-seed engine runs one depth-bounded BFS per seed, keeps only
//! tracks reachable from *every* seed, and sorts by total hop distance
//! ascending, total path weight descending, then track id. That is a total
//! order, so results are deterministic across runs.
//!
//! ## Error Handling
//!
//! Public functions return `anyhow::Result`. Argument validation failures
//! are typed ([`retrieval::RetrievalError`]) and raised before any store
//! access; store failures propagate unchanged, with no retries.

pub mod builder;
pub mod cli;
pub mod config;
pub mod db;
pub mod retrieval;
pub mod store;
pub mod track;
