//! # Configuration Module
//!
//! Data directory handling for Segue. The graph database lives in the
//! platform-standard data directory:
//! - Linux: `~/.local/share/segue/graph.db`
//! - macOS: `~/Library/Application Support/segue/graph.db`
//! - Windows: `%APPDATA%\segue\graph.db`

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the default graph database path, creating the `segue` data
/// directory if it does not exist yet.
///
/// # Errors
///
/// Fails when the platform data directory cannot be determined or the
/// `segue` subdirectory cannot be created.
pub fn default_db_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine the system data directory")?;
    db_path_under(&base)
}

/// Database path inside `base`, creating the `segue` subdirectory on
/// first use.
fn db_path_under(base: &Path) -> Result<PathBuf> {
    let data_dir = base.join("segue");
    fs::create_dir_all(&data_dir).with_context(|| {
        format!(
            "Failed to create Segue data directory at {}",
            data_dir.display()
        )
    })?;
    Ok(data_dir.join("graph.db"))
}
