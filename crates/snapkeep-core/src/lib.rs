//! Core of snapkeep: periodically fetch one remote file into timestamped
//! snapshots and delete snapshots older than the retention window.

pub mod config;
pub mod logging;

pub mod control;
pub mod fetcher;
pub mod retention;
pub mod scheduler;
pub mod snapshot;
pub mod storage;
