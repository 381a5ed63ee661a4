//! Snapshot fetcher.
//!
//! One call = one HTTP GET: the body is streamed into a `.part` file in the
//! destination directory and renamed to `webui_bk_<YYYYMMDD>_<HHMMSS>.db` once
//! complete. No retries here; the scheduler's interval is the retry.

mod error;
mod transfer;

pub use error::{FetchError, InvalidUrl};

use crate::config::FetchConfig;
use crate::snapshot::{SnapshotDescriptor, SnapshotName};
use crate::storage::temp_path;
use chrono::{Local, NaiveDateTime};
use std::path::Path;

/// Checks that `url` is non-empty, parses, and uses `http` or `https`.
pub fn validate_source_url(url: &str) -> Result<url::Url, InvalidUrl> {
    let invalid = |reason: String| InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty".to_string()));
    }
    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

/// Downloads snapshots with a fixed set of transfer options.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    options: FetchConfig,
}

impl Fetcher {
    pub fn new(options: FetchConfig) -> Self {
        Self { options }
    }

    /// Fetch `url` into a new snapshot under `destination`, named after the
    /// local time at call start.
    pub fn fetch(&self, url: &str, destination: &Path) -> Result<SnapshotDescriptor, FetchError> {
        self.fetch_at(url, destination, Local::now().naive_local())
    }

    /// Like `fetch` with an explicit capture time (used for the snapshot name).
    pub fn fetch_at(
        &self,
        url: &str,
        destination: &Path,
        taken_at: NaiveDateTime,
    ) -> Result<SnapshotDescriptor, FetchError> {
        let parsed = validate_source_url(url)?;
        let name = SnapshotName::new(taken_at);

        std::fs::create_dir_all(destination).map_err(|e| {
            FetchError::Storage(anyhow::Error::new(e).context(format!(
                "failed to create destination directory {}",
                destination.display()
            )))
        })?;

        let final_path = destination.join(name.file_name());
        if final_path.exists() {
            return Err(FetchError::AlreadyExists(final_path));
        }

        tracing::debug!(url = %parsed, path = %final_path.display(), "fetch started");
        let bytes = transfer::download_to(
            parsed.as_str(),
            &temp_path(&final_path),
            &final_path,
            &self.options,
        )?;
        tracing::info!(path = %final_path.display(), bytes, "snapshot written");

        Ok(SnapshotDescriptor::new(destination, name, bytes))
    }
}
