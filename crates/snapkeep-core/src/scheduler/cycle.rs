//! The worker loop: fetch, prune, wait, repeat until cancelled.

use chrono::Local;

use crate::control::CancelToken;
use crate::retention;

use super::job::Shared;
use super::log::JobEvent;

/// How a cycle ended, which decides the following wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    /// URL or destination missing; re-check after the config backoff.
    WaitingForConfig,
    /// Fetch and prune ran (whatever their results); wait the full interval.
    Completed,
}

/// Runs cycles until `token` is cancelled, then logs `Stopped` once.
pub(super) fn run_loop(shared: &Shared, token: &CancelToken) {
    shared.log.emit(JobEvent::Started);
    while !token.is_cancelled() {
        let wait = match run_cycle(shared) {
            CycleOutcome::WaitingForConfig => shared.schedule.config_backoff,
            CycleOutcome::Completed => shared.schedule.interval,
        };
        tracing::debug!(wait_secs = wait.as_secs_f64(), "waiting for next cycle");
        if token.wait_timeout(wait) {
            break;
        }
    }
    shared.log.emit(JobEvent::Stopped);
}

/// One fetch-then-prune pass. Failures are logged, never returned.
fn run_cycle(shared: &Shared) -> CycleOutcome {
    let config = shared.config();
    let (url, destination) = match config.ready() {
        Ok(ready) => ready,
        Err(e) => {
            tracing::debug!("cycle deferred: {}", e);
            shared.log.emit(JobEvent::WaitingForConfig);
            return CycleOutcome::WaitingForConfig;
        }
    };

    match shared.fetcher.fetch(url, destination) {
        Ok(snapshot) => shared.log.emit(JobEvent::Fetched {
            path: snapshot.path,
            bytes: snapshot.bytes,
        }),
        Err(e) => shared.log.emit(JobEvent::FetchFailed {
            error: e.to_string(),
        }),
    }

    let now = Local::now().naive_local();
    match retention::prune(destination, shared.schedule.retention_days, now) {
        Ok(report) => {
            for failure in &report.failures {
                shared.log.emit(JobEvent::PruneFileFailed {
                    error: failure.to_string(),
                });
            }
            if report.any_removed() {
                shared.log.emit(JobEvent::Pruned {
                    removed: report.removed,
                });
            } else {
                shared.log.emit(JobEvent::NothingPruned);
            }
        }
        Err(e) => shared.log.emit(JobEvent::PruneFailed {
            error: format!("{:#}", e),
        }),
    }

    CycleOutcome::Completed
}

