//! Disk I/O and snapshot file lifecycle.
//!
//! The body is streamed into a `.part` temp file next to the final name;
//! only a fully written and synced file is moved to its snapshot name, so
//! the pruner and operators never see a half-written snapshot.

mod writer;

pub use writer::SnapshotWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.db` → `a.db.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
