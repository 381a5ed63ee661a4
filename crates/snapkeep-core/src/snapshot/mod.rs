//! Snapshot files: naming convention and descriptors.
//!
//! A snapshot is one downloaded copy of the remote resource stored as
//! `webui_bk_<YYYYMMDD>_<HHMMSS>.db`. The embedded local timestamp is both the
//! collision guard between runs and the retention key.

mod name;

pub use name::{NameMatch, SnapshotName, SNAPSHOT_PREFIX, SNAPSHOT_SUFFIX};

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A snapshot file present on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDescriptor {
    pub path: PathBuf,
    pub file_name: String,
    pub taken_at: NaiveDateTime,
    pub bytes: u64,
}

impl SnapshotDescriptor {
    pub fn new(directory: &Path, name: SnapshotName, bytes: u64) -> Self {
        let file_name = name.file_name();
        Self {
            path: directory.join(&file_name),
            file_name,
            taken_at: name.taken_at(),
            bytes,
        }
    }
}
