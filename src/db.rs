//! # SQLite Graph Store
//!
//! Persistent [`GraphStore`] implementation over rusqlite. Edges are stored
//! once per unordered pair with the smaller id in `track_a`, so the
//! neighbor query unions both directions and the weight reads identically
//! from either end.

use crate::store::GraphStore;
use crate::track::TrackAttributes;
use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Graph store persisted in a SQLite database file.
///
/// Concurrency safety is whatever SQLite provides per connection; this
/// type does not add locking of its own.
#[derive(Debug)]
pub struct SqliteGraphStore {
    conn: Connection,
}

impl SqliteGraphStore {
    /// Open (creating if necessary) the database at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open graph database at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// In-memory SQLite database. Used by tests; behaves exactly like the
    /// file-backed variant within one process.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory graph database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS track (
                track_id       TEXT PRIMARY KEY,
                name           TEXT,
                external_urls  TEXT,
                release_date   TEXT,
                artist_name    TEXT,
                relevance      REAL,
                playlist_count INTEGER
            );
            CREATE TABLE IF NOT EXISTS co_occurrence (
                track_a TEXT    NOT NULL,
                track_b TEXT    NOT NULL,
                weight  INTEGER NOT NULL,
                PRIMARY KEY (track_a, track_b)
            );
            CREATE INDEX IF NOT EXISTS idx_co_occurrence_track_b
                ON co_occurrence (track_b);",
        )
        .context("Invalid SQL when CREATEing graph tables")?;

        Ok(Self { conn })
    }

    /// Number of track nodes in the database.
    pub fn track_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM track", [], |row| row.get(0))
            .context("Could not count track rows")
    }

    /// Number of undirected edges in the database.
    pub fn edge_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM co_occurrence", [], |row| row.get(0))
            .context("Could not count co-occurrence rows")
    }

    /// Stored attributes for one track, or `None` when the id is unknown.
    pub fn track_attributes(&self, track_id: &str) -> Result<Option<TrackAttributes>> {
        self.conn
            .query_row(
                "SELECT name, external_urls, release_date, artist_name,
                        relevance, playlist_count
                 FROM track WHERE track_id = ?1",
                [track_id],
                |row| {
                    Ok(TrackAttributes {
                        name: row.get(0)?,
                        external_urls: row.get(1)?,
                        release_date: row.get(2)?,
                        artist_name: row.get(3)?,
                        relevance: row.get(4)?,
                        playlist_count: row.get(5)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("Failed to query attributes for track '{track_id}'"))
    }
}

impl GraphStore for SqliteGraphStore {
    fn begin_bulk_load(&mut self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .context("Failed to open bulk-load transaction")
    }

    fn finish_bulk_load(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .context("Failed to commit bulk-load transaction")
    }

    fn upsert_track(&mut self, track_id: &str, attributes: &TrackAttributes) -> Result<()> {
        // COALESCE on the stored column keeps the first non-empty value for
        // descriptive fields; playlist_count takes the incoming value since
        // it is recomputed every build.
        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO track (track_id, name, external_urls, release_date,
                                    artist_name, relevance, playlist_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(track_id) DO UPDATE SET
                     name           = COALESCE(track.name, excluded.name),
                     external_urls  = COALESCE(track.external_urls, excluded.external_urls),
                     release_date   = COALESCE(track.release_date, excluded.release_date),
                     artist_name    = COALESCE(track.artist_name, excluded.artist_name),
                     relevance      = COALESCE(track.relevance, excluded.relevance),
                     playlist_count = COALESCE(excluded.playlist_count, track.playlist_count)",
            )
            .context("Invalid SQL when preparing track upsert")?;

        stmt.execute((
            track_id,
            &attributes.name,
            &attributes.external_urls,
            &attributes.release_date,
            &attributes.artist_name,
            attributes.relevance,
            attributes.playlist_count,
        ))
        .with_context(|| format!("Failed to upsert track '{track_id}'"))?;
        Ok(())
    }

    fn upsert_edge(&mut self, source_id: &str, target_id: &str, weight: u32) -> Result<()> {
        if source_id == target_id {
            bail!("Refusing self-loop edge on track '{source_id}'");
        }
        if weight == 0 {
            bail!("Refusing zero-weight edge between '{source_id}' and '{target_id}'");
        }

        // Canonical row order: smaller id in track_a.
        let (track_a, track_b) = if source_id < target_id {
            (source_id, target_id)
        } else {
            (target_id, source_id)
        };

        let mut stmt = self
            .conn
            .prepare_cached(
                "INSERT INTO co_occurrence (track_a, track_b, weight)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(track_a, track_b) DO UPDATE SET weight = excluded.weight",
            )
            .context("Invalid SQL when preparing edge upsert")?;

        stmt.execute((track_a, track_b, weight))
            .with_context(|| format!("Failed to upsert edge '{track_a}'-'{track_b}'"))?;
        Ok(())
    }

    fn related_tracks(&self, track_id: &str, limit: Option<usize>) -> Result<Vec<(String, u32)>> {
        // LIMIT -1 is SQLite for "no limit".
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let mut stmt = self
            .conn
            .prepare_cached(
                "SELECT neighbor, weight FROM (
                     SELECT track_b AS neighbor, weight
                         FROM co_occurrence WHERE track_a = ?1
                     UNION ALL
                     SELECT track_a AS neighbor, weight
                         FROM co_occurrence WHERE track_b = ?1
                 )
                 ORDER BY weight DESC, neighbor ASC
                 LIMIT ?2",
            )
            .context("Invalid SQL when preparing neighbor query")?;

        let rows = stmt
            .query_map((track_id, limit), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
            })
            .with_context(|| format!("Failed to query neighbors of '{track_id}'"))?;

        let mut neighbors = Vec::new();
        for row in rows {
            neighbors.push(row.context("Queried neighbor row unwrap failed")?);
        }
        Ok(neighbors)
    }
}
