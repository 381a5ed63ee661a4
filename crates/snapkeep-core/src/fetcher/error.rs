//! Fetch error types.

use std::path::PathBuf;

/// The source URL is empty, unparseable, or not `http`/`https`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid source URL {url:?}: {reason}")]
pub struct InvalidUrl {
    pub url: String,
    pub reason: String,
}

/// Error returned by a single fetch attempt. Every variant renders a
/// human-readable cause for the job log.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),
    /// Curl reported an error (DNS, connect, timeout, reset, etc.).
    #[error("transfer failed: {0}")]
    Transport(#[source] curl::Error),
    /// Final HTTP response had a non-2xx status; nothing was written.
    #[error("server returned HTTP {0}")]
    Http(u32),
    /// Creating the directory or writing, syncing, or renaming the file failed.
    #[error("storage: {0:#}")]
    Storage(anyhow::Error),
    /// A snapshot with the same timestamp is already on disk.
    #[error("snapshot already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}
