//! Sequential writer for a snapshot temp file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writer for one snapshot's temp file. Chunks are appended in arrival order.
pub struct SnapshotWriter {
    file: BufWriter<File>,
    temp_path: PathBuf,
    written: u64,
}

impl SnapshotWriter {
    /// Create a new temp file at `temp_path` (e.g. `destination.part`).
    /// Overwrites a stale temp file left by an interrupted run.
    pub fn create(temp_path: &Path) -> Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        Ok(SnapshotWriter {
            file: BufWriter::new(file),
            temp_path: temp_path.to_path_buf(),
            written: 0,
        })
    }

    /// Append `data` to the temp file.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .context("storage write failed")?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush, sync, and atomically move the temp file to `final_path`.
    /// Consumes the writer and closes the file; returns the number of bytes written.
    /// Never replaces an existing `final_path` (fails with `AlreadyExists`).
    /// On failure the temp file is removed.
    pub fn finalize(self, final_path: &Path) -> Result<u64> {
        let SnapshotWriter {
            file,
            temp_path,
            written,
        } = self;

        let synced = file
            .into_inner()
            .map_err(|e| anyhow::Error::new(e.into_error()))
            .and_then(|f| f.sync_all().context("storage sync failed"));
        if let Err(e) = synced {
            remove_temp(&temp_path);
            return Err(e);
        }

        if let Err(e) = publish(&temp_path, final_path) {
            remove_temp(&temp_path);
            return Err(e).with_context(|| {
                format!(
                    "failed to move {} to {}",
                    temp_path.display(),
                    final_path.display()
                )
            });
        }
        Ok(written)
    }

    /// Close and delete the temp file (failed or aborted transfer).
    pub fn discard(self) {
        let temp_path = self.temp_path.clone();
        drop(self.file);
        remove_temp(&temp_path);
    }
}

/// Link the temp file into place without replacing anything, then drop the
/// temp name. Filesystems without hard links fall back to a rename.
fn publish(temp_path: &Path, final_path: &Path) -> std::io::Result<()> {
    match std::fs::hard_link(temp_path, final_path) {
        Ok(()) => {
            remove_temp(temp_path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(e),
        Err(e) => {
            tracing::debug!(path = %final_path.display(), "hard link failed ({}), renaming", e);
            std::fs::rename(temp_path, final_path)
        }
    }
}

fn remove_temp(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "could not remove temp file: {}", e);
        }
    }
}
