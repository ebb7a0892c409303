//! # Graph Store Abstraction
//!
//! Defines the [`GraphStore`] trait that the builder writes through and the
//! retrieval engine reads through, plus the in-process
//! [`MemoryGraphStore`] implementation. A persistent SQLite implementation
//! lives in [`crate::db`]; both satisfy the same contract, so retrieval code
//! never names a concrete store.
//!
//! ## Contract
//!
//! - Edges are undirected: upserting `(a, b)` and querying from either end
//!   reports the same weight.
//! - `related_tracks` is ranked by weight descending, ties broken by
//!   neighbor id ascending, and an unknown or disconnected id yields an
//!   empty list rather than an error.

use crate::track::TrackAttributes;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Common interface to upsert track nodes and their co-occurrence edges,
/// and to serve ranked neighbor lookups.
pub trait GraphStore {
    /// Create or merge a track node. Descriptive attributes already present
    /// on the node are kept; see [`TrackAttributes::merge_keep_existing`].
    fn upsert_track(&mut self, track_id: &str, attributes: &TrackAttributes) -> Result<()>;

    /// Create or replace the undirected edge between two distinct tracks.
    ///
    /// # Errors
    ///
    /// Rejects self-loops and zero weights; both indicate a builder bug.
    fn upsert_edge(&mut self, source_id: &str, target_id: &str, weight: u32) -> Result<()>;

    /// Ranked `(neighbor id, edge weight)` pairs for `track_id`, weight
    /// descending then id ascending, truncated to `limit` when given.
    /// Unknown ids yield an empty vec.
    fn related_tracks(&self, track_id: &str, limit: Option<usize>) -> Result<Vec<(String, u32)>>;

    /// Mark the start of a bulk write. Transactional stores open a
    /// transaction here so a build commits once instead of per row; the
    /// default is a no-op.
    fn begin_bulk_load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Commit a bulk write started with [`GraphStore::begin_bulk_load`].
    /// If the load fails before this is called, transactional stores roll
    /// the partial write back when the connection drops.
    fn finish_bulk_load(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sort neighbors into the contract order: weight descending, id ascending.
pub(crate) fn rank_neighbors(mut neighbors: Vec<(String, u32)>) -> Vec<(String, u32)> {
    neighbors.sort_by(|(id_a, w_a), (id_b, w_b)| w_b.cmp(w_a).then_with(|| id_a.cmp(id_b)));
    neighbors
}

/// Graph store backed by plain hash maps.
///
/// Suited to one-shot builds and tests; nothing survives the process.
/// Not safe for concurrent mutation and read without caller-side locking.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    nodes: HashMap<String, TrackAttributes>,
    adjacency: HashMap<String, HashMap<String, u32>>,
}

#[derive(Serialize)]
struct ExportedGraph<'a> {
    tracks: BTreeMap<&'a str, &'a TrackAttributes>,
    edges: Vec<(&'a str, &'a str, u32)>,
}

impl MemoryGraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of track nodes currently stored.
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges currently stored.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency
            .values()
            .map(HashMap::len)
            .sum::<usize>()
            / 2
    }

    /// Write the whole graph as JSON, the in-process analogue of a
    /// database dump. Edges are listed once, smaller id first, sorted,
    /// so repeated exports of the same graph are byte-identical.
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let mut edges: Vec<(&str, &str, u32)> = self
            .adjacency
            .iter()
            .flat_map(|(source, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |(target, _)| source.as_str() < target.as_str())
                    .map(move |(target, weight)| (source.as_str(), target.as_str(), *weight))
            })
            .collect();
        edges.sort_unstable();

        let exported = ExportedGraph {
            tracks: self
                .nodes
                .iter()
                .map(|(id, attrs)| (id.as_str(), attrs))
                .collect(),
            edges,
        };
        let payload = serde_json::to_string_pretty(&exported)
            .context("Failed to serialize graph for JSON export")?;
        fs::write(path, payload)
            .with_context(|| format!("Failed to write graph export to {}", path.display()))?;

        log::info!(
            "Exported {} tracks and {} edges to {}",
            self.track_count(),
            self.edge_count(),
            path.display()
        );
        Ok(())
    }
}

impl GraphStore for MemoryGraphStore {
    fn upsert_track(&mut self, track_id: &str, attributes: &TrackAttributes) -> Result<()> {
        self.nodes
            .entry(track_id.to_string())
            .or_default()
            .merge_keep_existing(attributes);
        Ok(())
    }

    fn upsert_edge(&mut self, source_id: &str, target_id: &str, weight: u32) -> Result<()> {
        if source_id == target_id {
            bail!("Refusing self-loop edge on track '{source_id}'");
        }
        if weight == 0 {
            bail!("Refusing zero-weight edge between '{source_id}' and '{target_id}'");
        }

        self.adjacency
            .entry(source_id.to_string())
            .or_default()
            .insert(target_id.to_string(), weight);
        self.adjacency
            .entry(target_id.to_string())
            .or_default()
            .insert(source_id.to_string(), weight);
        Ok(())
    }

    fn related_tracks(&self, track_id: &str, limit: Option<usize>) -> Result<Vec<(String, u32)>> {
        let Some(neighbors) = self.adjacency.get(track_id) else {
            return Ok(Vec::new());
        };

        let mut ranked = rank_neighbors(
            neighbors
                .iter()
                .map(|(id, weight)| (id.clone(), *weight))
                .collect(),
        );
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }
}
