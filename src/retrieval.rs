//! # Related-Track Retrieval
//!
//! Query layer over a [`GraphStore`]. Two entry points:
//!
//! - [`related_tracks`]: thin projection of one ranked neighbor lookup for
//!   a single seed track.
//! - [`related_tracks_for_multiple`]: the multi-seed engine. Runs one
//!   depth-bounded breadth-first search per seed, intersects the reachable
//!   sets, and ranks the shared tracks by total hop distance, then total
//!   path weight, then id. [`related_tracks_for_multiple_details`] returns
//!   the same ranking with full per-seed hop/weight provenance.
//!
//! The engine is read-only and stateless between calls: every query builds
//! its reachability records from scratch and discards them on return. Store
//! failures surface unmodified; the only errors raised here are the
//! argument checks in [`RetrievalError`], evaluated before any store access.

use crate::store::GraphStore;
use anyhow::Result;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Argument validation failures, raised before the store is touched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalError {
    /// The result limit `k` must be non-negative (or omitted).
    #[error("result limit must be non-negative, got {0}")]
    NegativeLimit(i64),
    /// The hop bound must allow at least one traversal step.
    #[error("max_hops must be at least 1, got {0}")]
    HopBoundTooSmall(u32),
}

/// Best known path from one seed to one reachable track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedStats {
    /// Minimum hop distance found by the traversal.
    pub hops: u32,
    /// Largest cumulative edge weight among explored equal-hop paths.
    pub weight: u64,
}

/// One ranked candidate from the multi-seed engine, with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedDetail {
    pub track_id: String,
    /// Sum of per-seed hop distances.
    pub total_hops: u32,
    /// Sum of per-seed path weights.
    pub total_weight: u64,
    /// Per-seed breakdown, in first-occurrence seed order.
    pub per_seed: Vec<(String, SeedStats)>,
}

impl RelatedDetail {
    /// Stats for one seed, if it contributed to this candidate.
    #[must_use]
    pub fn seed_stats(&self, seed_id: &str) -> Option<&SeedStats> {
        self.per_seed
            .iter()
            .find(|(seed, _)| seed == seed_id)
            .map(|(_, stats)| stats)
    }
}

/// Check the optional result limit, converting it to a usize cap.
fn validate_limit(k: Option<i64>) -> Result<Option<usize>, RetrievalError> {
    match k {
        Some(k) if k < 0 => Err(RetrievalError::NegativeLimit(k)),
        #[allow(clippy::cast_sign_loss)]
        Some(k) => Ok(Some(k as usize)),
        None => Ok(None),
    }
}

/// Return up to `k` track ids connected to `track_id`, ranked by edge
/// weight (store order, verbatim).
///
/// # Errors
///
/// [`RetrievalError::NegativeLimit`] when `k` is negative; otherwise only
/// store failures.
pub fn related_tracks(track_id: &str, store: &dyn GraphStore, k: Option<i64>) -> Result<Vec<String>> {
    Ok(related_tracks_with_weights(track_id, store, k)?
        .into_iter()
        .map(|(id, _)| id)
        .collect())
}

/// Same lookup as [`related_tracks`], keeping the edge weights. Backs the
/// CLI output, which displays weight provenance.
///
/// # Errors
///
/// [`RetrievalError::NegativeLimit`] when `k` is negative; otherwise only
/// store failures.
pub fn related_tracks_with_weights(
    track_id: &str,
    store: &dyn GraphStore,
    k: Option<i64>,
) -> Result<Vec<(String, u32)>> {
    let limit = validate_limit(k)?;
    store.related_tracks(track_id, limit)
}

/// Return the ids of tracks reachable from *every* seed within `max_hops`
/// hops, ranked by total hop distance ascending, then total path weight
/// descending, then id ascending, truncated to `k` when given.
///
/// Duplicate seeds collapse to their first occurrence; seed ids never
/// appear in the result. An empty seed list yields an empty result without
/// touching the store.
///
/// # Errors
///
/// [`RetrievalError`] for a negative `k` or `max_hops < 1`, raised before
/// any store access; store failures propagate unchanged.
pub fn related_tracks_for_multiple(
    seeds: &[String],
    store: &dyn GraphStore,
    k: Option<i64>,
    max_hops: u32,
) -> Result<Vec<String>> {
    Ok(related_tracks_for_multiple_details(seeds, store, k, max_hops)?
        .into_iter()
        .map(|detail| detail.track_id)
        .collect())
}

/// Detail-returning variant of [`related_tracks_for_multiple`]: same
/// ranking, each candidate annotated with totals and the per-seed
/// hop/weight breakdown.
///
/// # Errors
///
/// Same conditions as [`related_tracks_for_multiple`].
pub fn related_tracks_for_multiple_details(
    seeds: &[String],
    store: &dyn GraphStore,
    k: Option<i64>,
    max_hops: u32,
) -> Result<Vec<RelatedDetail>> {
    let limit = validate_limit(k)?;
    if max_hops < 1 {
        return Err(RetrievalError::HopBoundTooSmall(max_hops).into());
    }
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    // De-duplicate, preserving first-occurrence order.
    let mut unique_seeds: Vec<&str> = Vec::new();
    let mut seed_set: HashSet<&str> = HashSet::new();
    for seed in seeds {
        if seed_set.insert(seed.as_str()) {
            unique_seeds.push(seed.as_str());
        }
    }

    // One bounded BFS per seed. A seed must never recommend itself or
    // another seed, so seed ids are stripped from every record.
    let mut reachability: Vec<HashMap<String, SeedStats>> =
        Vec::with_capacity(unique_seeds.len());
    for seed in &unique_seeds {
        let mut record = bounded_bfs(seed, store, max_hops)?;
        record.retain(|track_id, _| !seed_set.contains(track_id.as_str()));
        reachability.push(record);
    }

    // Intersect the reachable sets across all seeds.
    let Some((first, rest)) = reachability.split_first() else {
        return Ok(Vec::new());
    };
    let mut candidates: Vec<&str> = first
        .keys()
        .map(String::as_str)
        .filter(|track_id| rest.iter().all(|record| record.contains_key(*track_id)))
        .collect();

    let mut details: Vec<RelatedDetail> = candidates
        .drain(..)
        .map(|track_id| {
            let per_seed: Vec<(String, SeedStats)> = unique_seeds
                .iter()
                .zip(&reachability)
                .map(|(seed, record)| ((*seed).to_string(), record[track_id]))
                .collect();
            RelatedDetail {
                track_id: track_id.to_string(),
                total_hops: per_seed.iter().map(|(_, stats)| stats.hops).sum(),
                total_weight: per_seed.iter().map(|(_, stats)| stats.weight).sum(),
                per_seed,
            }
        })
        .collect();

    // Full lexicographic order; the trailing id comparison makes the
    // ranking total and therefore deterministic across runs.
    details.sort_by(|a, b| {
        a.total_hops
            .cmp(&b.total_hops)
            .then_with(|| b.total_weight.cmp(&a.total_weight))
            .then_with(|| a.track_id.cmp(&b.track_id))
    });

    if let Some(limit) = limit {
        details.truncate(limit);
    }
    Ok(details)
}

/// Depth-bounded BFS from one seed.
///
/// Records, per reachable track, the minimum hop distance and, among
/// equal-hop paths, the largest cumulative edge weight the traversal
/// found. A track is re-enqueued whenever its record improves (strictly
/// fewer hops, or equal hops with strictly more weight), so the weight is
/// maximal over explored paths rather than over all paths. Tracks sitting
/// exactly at the hop bound keep their record but are not expanded.
fn bounded_bfs(
    seed: &str,
    store: &dyn GraphStore,
    max_hops: u32,
) -> Result<HashMap<String, SeedStats>> {
    let mut record: HashMap<String, SeedStats> = HashMap::new();
    let mut queue: VecDeque<(String, u32, u64)> = VecDeque::new();
    queue.push_back((seed.to_string(), 0, 0));

    while let Some((track_id, hops, weight)) = queue.pop_front() {
        if hops == max_hops {
            continue;
        }

        for (neighbor, edge_weight) in store.related_tracks(&track_id, None)? {
            if neighbor == seed {
                continue;
            }
            let next_hops = hops + 1;
            let next_weight = weight + u64::from(edge_weight);

            let improved = match record.get(&neighbor) {
                None => true,
                Some(best) => {
                    next_hops < best.hops
                        || (next_hops == best.hops && next_weight > best.weight)
                }
            };
            if improved {
                record.insert(
                    neighbor.clone(),
                    SeedStats {
                        hops: next_hops,
                        weight: next_weight,
                    },
                );
                queue.push_back((neighbor, next_hops, next_weight));
            }
        }
    }

    Ok(record)
}
