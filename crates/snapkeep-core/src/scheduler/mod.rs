//! Scheduler loop for the snapshot job.
//!
//! `SnapshotJob` owns the job configuration, the worker thread and the log
//! sink. While running, the worker repeats one cycle (fetch → prune), then
//! waits the interval; with the URL or destination unset it only logs and
//! waits the shorter config backoff. A stop request wakes any wait at once.

mod cycle;
mod job;
mod log;

pub use job::{ConfigError, JobConfig, RunState, SnapshotJob, StartError};
pub use log::{JobEvent, LogEntry, LogLevel, LogReceiver, LogSink};
