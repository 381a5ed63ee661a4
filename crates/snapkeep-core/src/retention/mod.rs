//! Age-based retention for snapshot files.
//!
//! Only names following the snapshot convention are considered. Anything else
//! in the directory is left alone and not counted.

mod list;

pub use list::list_snapshots;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use std::path::Path;

use crate::snapshot::{NameMatch, SnapshotName};

/// Per-file failure while pruning. Recorded and skipped; never aborts the pass.
#[derive(Debug, thiserror::Error)]
pub enum PruneFileError {
    /// Snapshot prefix/suffix present but the embedded timestamp is invalid.
    #[error("{file_name}: malformed snapshot timestamp {stamp:?}")]
    MalformedName { file_name: String, stamp: String },
    /// The file was expired but could not be deleted.
    #[error("{file_name}: could not delete: {source}")]
    Remove {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one pruning pass.
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Names of the deleted snapshots, sorted.
    pub removed: Vec<String>,
    pub failures: Vec<PruneFileError>,
}

impl PruneReport {
    pub fn any_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Comma-joined removed names, or a "nothing removed" message.
    pub fn summary(&self) -> String {
        if self.removed.is_empty() {
            "no expired snapshots removed".to_string()
        } else {
            format!("removed {}", self.removed.join(", "))
        }
    }
}

/// Oldest timestamp that is still retained at `now`.
/// A window reaching past the earliest representable date retains everything.
pub fn cutoff(now: NaiveDateTime, retention_days: u32) -> NaiveDateTime {
    now.checked_sub_signed(Duration::days(i64::from(retention_days)))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Delete every snapshot in `directory` whose embedded timestamp is strictly
/// earlier than `now - retention_days`.
///
/// A missing directory is an empty success. Malformed names and failed
/// deletions are reported in `PruneReport::failures` and skipped.
pub fn prune(directory: &Path, retention_days: u32, now: NaiveDateTime) -> Result<PruneReport> {
    let mut report = PruneReport::default();
    if !directory.exists() {
        tracing::debug!(dir = %directory.display(), "prune: directory missing, nothing to do");
        return Ok(report);
    }

    let cutoff = cutoff(now, retention_days);
    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("failed to list {}", directory.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %directory.display(), "prune: unreadable entry: {}", e);
                continue;
            }
        };
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        let name = match SnapshotName::classify(file_name) {
            NameMatch::Foreign => continue,
            NameMatch::Malformed(stamp) => {
                let err = PruneFileError::MalformedName {
                    file_name: file_name.to_string(),
                    stamp,
                };
                tracing::warn!("prune: {}", err);
                report.failures.push(err);
                continue;
            }
            NameMatch::Snapshot(name) => name,
        };

        if name.taken_at() >= cutoff {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(file = file_name, "prune: removed expired snapshot");
                report.removed.push(file_name.to_string());
            }
            Err(source) => {
                let err = PruneFileError::Remove {
                    file_name: file_name.to_string(),
                    source,
                };
                tracing::warn!("prune: {}", err);
                report.failures.push(err);
            }
        }
    }

    report.removed.sort();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;

    fn at(y: i32, mo: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut v: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn removes_only_files_older_than_window() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "webui_bk_20240101_000000.db");
        touch(dir.path(), "webui_bk_20240109_000000.db");

        let report = prune(dir.path(), 7, at(2024, 1, 11)).unwrap();
        assert_eq!(report.removed, vec!["webui_bk_20240101_000000.db"]);
        assert!(report.failures.is_empty());
        assert!(report.any_removed());
        assert_eq!(names(dir.path()), vec!["webui_bk_20240109_000000.db"]);
    }

    #[test]
    fn boundary_timestamp_is_retained() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "webui_bk_20240104_000000.db");
        touch(dir.path(), "webui_bk_20240103_235959.db");

        let report = prune(dir.path(), 7, at(2024, 1, 11)).unwrap();
        assert_eq!(report.removed, vec!["webui_bk_20240103_235959.db"]);
        assert_eq!(names(dir.path()), vec!["webui_bk_20240104_000000.db"]);
    }

    #[test]
    fn foreign_and_malformed_names_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "webui_bk_bad_name.db");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "webui_bk_20200101_000000.db.part");
        touch(dir.path(), "webui_bk_20200101_000000.db");

        let report = prune(dir.path(), 7, at(2024, 1, 11)).unwrap();
        assert_eq!(report.removed, vec!["webui_bk_20200101_000000.db"]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            PruneFileError::MalformedName { file_name, .. } if file_name == "webui_bk_bad_name.db"
        ));
        assert_eq!(
            names(dir.path()),
            vec![
                "notes.txt",
                "webui_bk_20200101_000000.db.part",
                "webui_bk_bad_name.db",
            ]
        );
    }

    #[test]
    fn failed_delete_does_not_stop_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        // A directory with a snapshot name cannot be removed with remove_file.
        fs::create_dir(dir.path().join("webui_bk_20200101_000000.db")).unwrap();
        touch(dir.path(), "webui_bk_20200102_000000.db");

        let report = prune(dir.path(), 7, at(2024, 1, 11)).unwrap();
        assert_eq!(report.removed, vec!["webui_bk_20200102_000000.db"]);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(&report.failures[0], PruneFileError::Remove { .. }));
    }

    #[test]
    fn missing_directory_is_empty_success() {
        let dir = tempfile::tempdir().unwrap();
        let report = prune(&dir.path().join("absent"), 7, at(2024, 1, 11)).unwrap();
        assert!(!report.any_removed());
        assert!(report.failures.is_empty());
        assert_eq!(report.summary(), "no expired snapshots removed");
    }

    #[test]
    fn second_pass_at_same_time_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "webui_bk_20231201_120000.db");
        touch(dir.path(), "webui_bk_20231215_120000.db");
        touch(dir.path(), "webui_bk_20240110_120000.db");
        let now = at(2024, 1, 11);

        let first = prune(dir.path(), 7, now).unwrap();
        assert_eq!(first.removed.len(), 2);
        let second = prune(dir.path(), 7, now).unwrap();
        assert!(second.removed.is_empty());
        assert_eq!(names(dir.path()), vec!["webui_bk_20240110_120000.db"]);
    }

    #[test]
    fn summary_joins_removed_names() {
        let report = PruneReport {
            removed: vec!["a.db".to_string(), "b.db".to_string()],
            failures: Vec::new(),
        };
        assert_eq!(report.summary(), "removed a.db, b.db");
    }

    #[test]
    fn cutoff_subtracts_whole_days() {
        assert_eq!(cutoff(at(2024, 1, 11), 7), at(2024, 1, 4));
        assert_eq!(cutoff(at(2024, 3, 1), 1), at(2024, 2, 29));
    }

    #[test]
    fn huge_window_retains_everything() {
        assert_eq!(cutoff(at(2024, 1, 11), u32::MAX), NaiveDateTime::MIN);

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "webui_bk_00010101_000000.db");
        touch(dir.path(), "webui_bk_20000101_000000.db");
        let report = prune(dir.path(), u32::MAX, at(2024, 1, 11)).unwrap();
        assert!(!report.any_removed());
        assert!(report.failures.is_empty());
        assert_eq!(names(dir.path()).len(), 2);
    }
}
