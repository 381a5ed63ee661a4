//! Job log: timestamped outcome lines sent from the worker to the control surface.
//!
//! Every entry is also emitted through `tracing`, so the log file carries the
//! same history as the on-screen log.

use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Receiving end of the job log, owned by the control surface.
pub type LogReceiver = mpsc::UnboundedReceiver<LogEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Something the scheduler loop did or observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Started,
    /// URL or destination unset; the loop retries after the config backoff.
    WaitingForConfig,
    Fetched { path: PathBuf, bytes: u64 },
    FetchFailed { error: String },
    Pruned { removed: Vec<String> },
    NothingPruned,
    /// One file was skipped during pruning.
    PruneFileFailed { error: String },
    /// The destination could not be listed at all.
    PruneFailed { error: String },
    Stopped,
}

impl JobEvent {
    pub fn level(&self) -> LogLevel {
        match self {
            JobEvent::FetchFailed { .. } | JobEvent::PruneFailed { .. } => LogLevel::Error,
            JobEvent::WaitingForConfig | JobEvent::PruneFileFailed { .. } => LogLevel::Warn,
            JobEvent::Started
            | JobEvent::Fetched { .. }
            | JobEvent::Pruned { .. }
            | JobEvent::NothingPruned
            | JobEvent::Stopped => LogLevel::Info,
        }
    }
}

impl fmt::Display for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobEvent::Started => write!(f, "job started"),
            JobEvent::WaitingForConfig => write!(
                f,
                "waiting for configuration: source URL and destination directory must both be set"
            ),
            JobEvent::Fetched { path, bytes } => {
                write!(f, "fetched {} bytes to {}", bytes, path.display())
            }
            JobEvent::FetchFailed { error } => write!(f, "fetch failed: {}", error),
            JobEvent::Pruned { removed } => {
                write!(f, "removed expired snapshots: {}", removed.join(", "))
            }
            JobEvent::NothingPruned => write!(f, "no expired snapshots removed"),
            JobEvent::PruneFileFailed { error } => write!(f, "prune skipped {}", error),
            JobEvent::PruneFailed { error } => write!(f, "prune failed: {}", error),
            JobEvent::Stopped => write!(f, "job stopped"),
        }
    }
}

/// One line of the job log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time the event was recorded.
    pub at: NaiveDateTime,
    pub event: JobEvent,
}

impl LogEntry {
    pub fn now(event: JobEvent) -> Self {
        Self {
            at: Local::now().naive_local(),
            event,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.event.level()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.at.format("%Y-%m-%d %H:%M:%S"), self.event)
    }
}

/// Sending end of the job log. Cloneable; sends never block.
#[derive(Debug, Clone)]
pub struct LogSink {
    tx: mpsc::UnboundedSender<LogEntry>,
}

impl LogSink {
    pub fn channel() -> (Self, LogReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Record `event`. A closed receiver only drops the on-screen copy.
    pub fn emit(&self, event: JobEvent) {
        let entry = LogEntry::now(event);
        match entry.level() {
            LogLevel::Info => tracing::info!("{}", entry.event),
            LogLevel::Warn => tracing::warn!("{}", entry.event),
            LogLevel::Error => tracing::error!("{}", entry.event),
        }
        let _ = self.tx.send(entry);
    }
}
