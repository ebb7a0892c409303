//! # Graph Builder
//!
//! Turns a playlist/track CSV export into graph writes: one node upsert per
//! distinct track and one weighted edge per unordered pair of tracks that
//! share at least one playlist, the weight being the number of shared
//! playlists.
//!
//! Rows need `track_id` and `playlist_id`; rows missing either are skipped.
//! The optional descriptive columns (`track_name`, `track_external_urls`,
//! `release_date`, `artist_name`, `relevance`) are kept on first non-empty
//! occurrence per track. Pair counting runs per playlist and is
//! parallelized with rayon; the merge is a commutative sum, so the counts
//! are deterministic regardless of scheduling.
//!
//! The CSV reader is a small local one: quoted fields, doubled-quote
//! escapes, and newlines inside quotes are supported, which covers what
//! the playlist exports actually contain.

use crate::store::GraphStore;
use crate::track::TrackAttributes;
use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Counts reported after a build, mostly for CLI output and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub tracks: usize,
    pub playlists: usize,
    pub edges: usize,
}

/// Load a CSV export and populate `store` with tracks and co-occurrence
/// edges.
///
/// # Errors
///
/// Fails when the file cannot be read or a store write fails; malformed
/// rows are skipped, not fatal.
pub fn build_track_graph_from_csv(
    csv_path: &Path,
    store: &mut dyn GraphStore,
) -> Result<BuildSummary> {
    let content = fs::read_to_string(csv_path)
        .with_context(|| format!("CSV file not found or unreadable: {}", csv_path.display()))?;

    let records = parse_csv(&content);
    let Some((header, rows)) = records.split_first() else {
        warn!("CSV file {} is empty; nothing to build", csv_path.display());
        return Ok(BuildSummary {
            tracks: 0,
            playlists: 0,
            edges: 0,
        });
    };

    let columns: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim(), index))
        .collect();
    let field = |row: &[String], name: &str| -> Option<String> {
        columns
            .get(name)
            .and_then(|&index| row.get(index))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let mut playlist_tracks: HashMap<String, Vec<String>> = HashMap::new();
    // BTreeMap keeps the node upsert order stable across builds.
    let mut track_attrs: BTreeMap<String, TrackAttributes> = BTreeMap::new();
    let mut track_playlists: HashMap<String, HashSet<String>> = HashMap::new();

    for row in rows {
        let (Some(track_id), Some(playlist_id)) =
            (field(row, "track_id"), field(row, "playlist_id"))
        else {
            continue;
        };

        playlist_tracks
            .entry(playlist_id.clone())
            .or_default()
            .push(track_id.clone());
        track_playlists
            .entry(track_id.clone())
            .or_default()
            .insert(playlist_id);

        let attrs = track_attrs.entry(track_id).or_default();
        TrackAttributes::set_once(&mut attrs.name, field(row, "track_name").as_deref());
        TrackAttributes::set_once(
            &mut attrs.external_urls,
            field(row, "track_external_urls").as_deref(),
        );
        TrackAttributes::set_once(
            &mut attrs.release_date,
            field(row, "release_date").as_deref(),
        );
        TrackAttributes::set_once(&mut attrs.artist_name, field(row, "artist_name").as_deref());
        if attrs.relevance.is_none() {
            attrs.relevance = field(row, "relevance").and_then(|raw| raw.parse::<f64>().ok());
        }
    }

    for (track_id, playlists) in &track_playlists {
        if let Some(attrs) = track_attrs.get_mut(track_id) {
            attrs.playlist_count = Some(u32::try_from(playlists.len()).unwrap_or(u32::MAX));
        }
    }

    info!(
        "Loaded {} tracks across {} playlists from {}",
        track_attrs.len(),
        playlist_tracks.len(),
        csv_path.display()
    );

    let edge_weights = count_co_occurrences(&playlist_tracks);
    info!("Computed {} co-occurrence edges", edge_weights.len());

    // One transaction for the whole load on transactional stores; an
    // aborted load rolls back with the connection.
    store.begin_bulk_load()?;
    for (track_id, attrs) in &track_attrs {
        store.upsert_track(track_id, attrs)?;
    }
    for ((source_id, target_id), weight) in &edge_weights {
        store.upsert_edge(source_id, target_id, *weight)?;
    }
    store.finish_bulk_load()?;

    Ok(BuildSummary {
        tracks: track_attrs.len(),
        playlists: playlist_tracks.len(),
        edges: edge_weights.len(),
    })
}

/// One weight per unordered pair of tracks sharing a playlist, summed over
/// playlists. Returned as a BTreeMap so edge upserts happen in a stable
/// order.
fn count_co_occurrences(
    playlist_tracks: &HashMap<String, Vec<String>>,
) -> BTreeMap<(String, String), u32> {
    playlist_tracks
        .par_iter()
        .map(|(_, tracks)| {
            // Duplicate listings of a track within one playlist count once.
            let mut unique: Vec<&str> = tracks
                .iter()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();
            unique.sort_unstable();

            let mut local: BTreeMap<(String, String), u32> = BTreeMap::new();
            for (i, left) in unique.iter().enumerate() {
                for right in &unique[i + 1..] {
                    *local
                        .entry(((*left).to_string(), (*right).to_string()))
                        .or_insert(0) += 1;
                }
            }
            local
        })
        .reduce(BTreeMap::new, |mut acc, local| {
            for (pair, count) in local {
                *acc.entry(pair).or_insert(0) += count;
            }
            acc
        })
}

/// Minimal CSV reader: comma-separated, `"`-quoted fields with doubled-quote
/// escapes, quoted newlines preserved, CRLF tolerated.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    // Final record when the file lacks a trailing newline.
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGraphStore;
    use std::io::Write;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    /// Memory store wrapper counting the bulk-load bracket calls.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryGraphStore,
        begins: usize,
        finishes: usize,
    }

    impl GraphStore for CountingStore {
        fn upsert_track(&mut self, track_id: &str, attributes: &TrackAttributes) -> Result<()> {
            assert_eq!(self.begins, 1, "writes must happen inside the bulk load");
            self.inner.upsert_track(track_id, attributes)
        }

        fn upsert_edge(&mut self, source_id: &str, target_id: &str, weight: u32) -> Result<()> {
            assert_eq!(self.begins, 1, "writes must happen inside the bulk load");
            self.inner.upsert_edge(source_id, target_id, weight)
        }

        fn related_tracks(
            &self,
            track_id: &str,
            limit: Option<usize>,
        ) -> Result<Vec<(String, u32)>> {
            self.inner.related_tracks(track_id, limit)
        }

        fn begin_bulk_load(&mut self) -> Result<()> {
            self.begins += 1;
            Ok(())
        }

        fn finish_bulk_load(&mut self) -> Result<()> {
            self.finishes += 1;
            Ok(())
        }
    }

    #[test]
    fn parses_quoted_fields_and_escapes() {
        let parsed = parse_csv("a,\"b, with comma\",\"he said \"\"hi\"\"\"\nx,\"multi\nline\",z");
        assert_eq!(
            parsed,
            vec![
                vec![
                    "a".to_string(),
                    "b, with comma".to_string(),
                    "he said \"hi\"".to_string()
                ],
                vec!["x".to_string(), "multi\nline".to_string(), "z".to_string()],
            ]
        );
    }

    #[test]
    fn builds_weighted_co_occurrence_graph() {
        let file = csv_file(
            "track_id,playlist_id,track_name,artist_name,relevance\n\
             t1,p1,First,Band A,0.9\n\
             t2,p1,Second,Band B,\n\
             t1,p2,Renamed,,0.1\n\
             t2,p2,,,\n\
             t3,p2,Third,Band C,bad-number\n",
        );
        let mut store = MemoryGraphStore::new();

        let summary = build_track_graph_from_csv(file.path(), &mut store).unwrap();
        assert_eq!(
            summary,
            BuildSummary {
                tracks: 3,
                playlists: 2,
                edges: 3
            }
        );

        // t1-t2 co-occur in both playlists; the others only in p2.
        assert_eq!(
            store.related_tracks("t1", None).unwrap(),
            vec![("t2".to_string(), 2), ("t3".to_string(), 1)]
        );
        assert_eq!(
            store.related_tracks("t3", None).unwrap(),
            vec![("t1".to_string(), 1), ("t2".to_string(), 1)]
        );
    }

    #[test]
    fn build_brackets_all_writes_in_one_bulk_load() {
        let file = csv_file(
            "track_id,playlist_id\n\
             t1,p1\n\
             t2,p1\n\
             t3,p1\n",
        );
        let mut store = CountingStore::default();

        build_track_graph_from_csv(file.path(), &mut store).unwrap();
        assert_eq!(store.begins, 1);
        assert_eq!(store.finishes, 1);
        assert_eq!(store.inner.edge_count(), 3);
    }

    #[test]
    fn rows_missing_required_fields_are_skipped() {
        let file = csv_file(
            "track_id,playlist_id\n\
             t1,p1\n\
             ,p1\n\
             t2,\n\
             t2,p1\n",
        );
        let mut store = MemoryGraphStore::new();

        let summary = build_track_graph_from_csv(file.path(), &mut store).unwrap();
        assert_eq!(summary.tracks, 2);
        assert_eq!(summary.edges, 1);
    }

    #[test]
    fn duplicate_listings_within_a_playlist_count_once() {
        let file = csv_file(
            "track_id,playlist_id\n\
             t1,p1\n\
             t1,p1\n\
             t2,p1\n",
        );
        let mut store = MemoryGraphStore::new();

        build_track_graph_from_csv(file.path(), &mut store).unwrap();
        assert_eq!(
            store.related_tracks("t1", None).unwrap(),
            vec![("t2".to_string(), 1)]
        );
    }

    #[test]
    fn empty_file_builds_an_empty_graph() {
        let file = csv_file("");
        let mut store = MemoryGraphStore::new();

        let summary = build_track_graph_from_csv(file.path(), &mut store).unwrap();
        assert_eq!(
            summary,
            BuildSummary {
                tracks: 0,
                playlists: 0,
                edges: 0
            }
        );
    }

    #[test]
    fn counts_pairs_across_playlists() {
        let mut playlists: HashMap<String, Vec<String>> = HashMap::new();
        playlists.insert(
            "p1".to_string(),
            vec!["b".to_string(), "a".to_string(), "c".to_string()],
        );
        playlists.insert("p2".to_string(), vec!["a".to_string(), "b".to_string()]);

        let weights = count_co_occurrences(&playlists);
        assert_eq!(weights[&("a".to_string(), "b".to_string())], 2);
        assert_eq!(weights[&("a".to_string(), "c".to_string())], 1);
        assert_eq!(weights[&("b".to_string(), "c".to_string())], 1);
        assert_eq!(weights.len(), 3);
    }
}
