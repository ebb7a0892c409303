//! # Segue - Related-Track Retrieval CLI
//!
//! Builds a playlist co-occurrence graph and answers related-track queries
//! against it.
//!
//! ## Usage
//!
//! ```bash
//! # Ingest a playlist CSV export into the default SQLite database
//! segue build --csv-path data/songs.csv
//!
//! # Ranked neighbors of a single track
//! segue related 4uLU6hMCjMI75M1A2tKUQC -k 10
//!
//! # Tracks shared between several seeds within two hops
//! segue related seed_a seed_b --max-hops 2
//!
//! # One-shot query without touching disk
//! segue related seed_a seed_b --store memory --csv-path data/songs.csv
//! ```
//!
//! Logging is controlled via `RUST_LOG` (e.g. `RUST_LOG=debug segue build ...`).

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use log::info;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

use segue::builder;
use segue::cli::{self, StoreKind};
use segue::config;
use segue::db::SqliteGraphStore;
use segue::retrieval;
use segue::store::{GraphStore, MemoryGraphStore};

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    match args.command {
        cli::Command::Build {
            csv_path,
            store,
            db_path,
            export_json,
        } => run_build(&csv_path, store, db_path, export_json),
        cli::Command::Related {
            seeds,
            limit,
            max_hops,
            store,
            db_path,
            csv_path,
            rebuild,
        } => run_related(&seeds, limit, max_hops, store, db_path, csv_path, rebuild),
        cli::Command::Completions { shell } => {
            let mut cmd = cli::Args::command();
            clap_complete::generate(shell, &mut cmd, "segue", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Build the graph into the selected store.
fn run_build(
    csv_path: &Path,
    store_kind: StoreKind,
    db_path: Option<PathBuf>,
    export_json: Option<PathBuf>,
) -> Result<()> {
    let csv_path = resolve_csv_path(csv_path)?;

    match store_kind {
        StoreKind::Sqlite => {
            if export_json.is_some() {
                bail!("--export-json is only supported with --store memory");
            }
            let db_path = resolve_db_path(db_path)?;
            info!("Building graph from {} into {}", csv_path.display(), db_path.display());

            let mut store = SqliteGraphStore::open(&db_path)?;
            let summary = builder::build_track_graph_from_csv(&csv_path, &mut store)?;
            println!(
                "Built graph: {} tracks, {} playlists, {} edges -> {}",
                summary.tracks,
                summary.playlists,
                summary.edges,
                db_path.display()
            );
        }
        StoreKind::Memory => {
            let mut store = MemoryGraphStore::new();
            let summary = builder::build_track_graph_from_csv(&csv_path, &mut store)?;
            println!(
                "Built graph: {} tracks, {} playlists, {} edges (in memory)",
                summary.tracks, summary.playlists, summary.edges
            );

            match export_json {
                Some(path) => store.export_json(&path)?,
                None => {
                    println!("Note: the memory store does not persist; use --export-json or --store sqlite to keep the graph.");
                }
            }
        }
    }
    Ok(())
}

/// Open or build the selected store, then run the query.
fn run_related(
    seeds: &[String],
    limit: Option<i64>,
    max_hops: u32,
    store_kind: StoreKind,
    db_path: Option<PathBuf>,
    csv_path: Option<PathBuf>,
    rebuild: bool,
) -> Result<()> {
    match store_kind {
        StoreKind::Memory => {
            let csv_path = csv_path
                .context("--csv-path is required with --store memory (nothing is persisted)")?;
            let mut store = MemoryGraphStore::new();
            builder::build_track_graph_from_csv(&resolve_csv_path(&csv_path)?, &mut store)?;
            query_and_print(&store, seeds, limit, max_hops)
        }
        StoreKind::Sqlite => {
            let db_path = resolve_db_path(db_path)?;
            let mut store = SqliteGraphStore::open(&db_path)?;
            if rebuild {
                // clap guarantees csv_path is present alongside --rebuild.
                let csv_path = csv_path.context("--rebuild requires --csv-path")?;
                builder::build_track_graph_from_csv(&resolve_csv_path(&csv_path)?, &mut store)?;
            }
            query_and_print(&store, seeds, limit, max_hops)
        }
    }
}

/// Print the ranked, 1-indexed result listing.
///
/// One seed routes to the direct neighbor query; several seeds route to
/// the multi-seed engine with per-seed hop/weight provenance.
fn query_and_print(
    store: &dyn GraphStore,
    seeds: &[String],
    limit: Option<i64>,
    max_hops: u32,
) -> Result<()> {
    if let [seed] = seeds {
        let pairs = retrieval::related_tracks_with_weights(seed, store, limit)?;
        if pairs.is_empty() {
            println!("No related tracks found for '{seed}'.");
            return Ok(());
        }

        println!("Top related tracks (1 hop) for '{seed}':");
        for (index, (track_id, weight)) in pairs.iter().enumerate() {
            println!("{:>2}. {track_id} (weight={weight})", index + 1);
        }
        return Ok(());
    }

    let details = retrieval::related_tracks_for_multiple_details(seeds, store, limit, max_hops)?;
    if details.is_empty() {
        println!("No shared related tracks found within the hop limit.");
        return Ok(());
    }

    println!("Shared related tracks (total_hops, total_weight, per-seed distance/weight):");
    for (index, detail) in details.iter().enumerate() {
        let per_seed = detail
            .per_seed
            .iter()
            .map(|(seed, stats)| format!("{seed}:{}h/{}w", stats.hops, stats.weight))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>2}. {} (total_hops={}, total_weight={}) [{per_seed}]",
            index + 1,
            detail.track_id,
            detail.total_hops,
            detail.total_weight
        );
    }
    Ok(())
}

fn resolve_csv_path(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .with_context(|| format!("Failed to resolve CSV path {}", path.display()))?
        .into_owned())
}

fn resolve_db_path(db_path: Option<PathBuf>) -> Result<PathBuf> {
    match db_path {
        Some(path) => Ok(path),
        None => config::default_db_path(),
    }
}
