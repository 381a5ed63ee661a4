//! Listing of the snapshots currently on disk.

use anyhow::{Context, Result};
use std::path::Path;

use crate::snapshot::{SnapshotDescriptor, SnapshotName};

/// Well-formed snapshots directly inside `directory`, oldest first.
/// A missing directory yields an empty list.
pub fn list_snapshots(directory: &Path) -> Result<Vec<SnapshotDescriptor>> {
    if !directory.exists() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("failed to list {}", directory.display()))?;

    let mut snapshots = Vec::new();
    for entry in entries.flatten() {
        let Some(name) = entry.file_name().to_str().and_then(SnapshotName::parse) else {
            continue;
        };
        let meta = match entry.metadata() {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };
        snapshots.push(SnapshotDescriptor::new(directory, name, meta.len()));
    }
    snapshots.sort_by_key(|s| s.taken_at);
    Ok(snapshots)
}
