//! `SnapshotJob`: the context object shared by the control surface and the worker.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::JoinHandle;

use crate::config::Schedule;
use crate::control::CancelToken;
use crate::fetcher::{validate_source_url, Fetcher, InvalidUrl};

use super::cycle;
use super::log::{LogReceiver, LogSink};

/// Whether the worker loop is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// A required job setting is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("source URL is not set")]
    MissingUrl,
    #[error("destination directory is not set")]
    MissingDestination,
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrl),
}

/// Why `SnapshotJob::start` refused to start.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("job is already running")]
    AlreadyRunning,
    #[error("could not spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Source URL and destination directory. Either may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobConfig {
    pub url: Option<String>,
    pub destination: Option<PathBuf>,
}

impl JobConfig {
    /// Both fields, or the first missing one.
    pub fn ready(&self) -> Result<(&str, &PathBuf), ConfigError> {
        let url = self
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let destination = self
            .destination
            .as_ref()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or(ConfigError::MissingDestination)?;
        Ok((url, destination))
    }
}

/// State the worker thread reads on every cycle.
pub(super) struct Shared {
    pub(super) config: RwLock<JobConfig>,
    pub(super) schedule: Schedule,
    pub(super) fetcher: Fetcher,
    pub(super) log: LogSink,
    running: AtomicBool,
}

impl Shared {
    pub(super) fn config(&self) -> JobConfig {
        self.config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Clears the running flag when the worker exits, even by panic.
struct RunningGuard(Arc<Shared>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}

struct Worker {
    token: CancelToken,
    handle: JoinHandle<()>,
}

/// Periodic fetch-and-prune job. At most one worker loop runs per job.
pub struct SnapshotJob {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl SnapshotJob {
    /// New idle job and the receiving end of its log.
    pub fn new(schedule: Schedule, fetcher: Fetcher) -> (Self, LogReceiver) {
        let (log, rx) = LogSink::channel();
        let shared = Arc::new(Shared {
            config: RwLock::new(JobConfig::default()),
            schedule,
            fetcher,
            log,
            running: AtomicBool::new(false),
        });
        let job = Self {
            shared,
            worker: Mutex::new(None),
        };
        (job, rx)
    }

    pub fn schedule(&self) -> Schedule {
        self.shared.schedule
    }

    fn write_config(&self) -> std::sync::RwLockWriteGuard<'_, JobConfig> {
        self.shared
            .config
            .write()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Validate and store both settings.
    pub fn set_config(&self, url: &str, destination: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let destination = destination.into();
        if destination.as_os_str().is_empty() {
            return Err(ConfigError::MissingDestination);
        }
        let url = checked_url(url)?;
        let mut cfg = self.write_config();
        cfg.url = Some(url);
        cfg.destination = Some(destination);
        Ok(())
    }

    pub fn set_url(&self, url: &str) -> Result<(), ConfigError> {
        let url = checked_url(url)?;
        self.write_config().url = Some(url);
        Ok(())
    }

    pub fn set_destination(&self, destination: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let destination = destination.into();
        if destination.as_os_str().is_empty() {
            return Err(ConfigError::MissingDestination);
        }
        self.write_config().destination = Some(destination);
        Ok(())
    }

    /// Unset both settings; a running loop waits until they are set again.
    pub fn clear_config(&self) {
        *self.write_config() = JobConfig::default();
    }

    pub fn config(&self) -> JobConfig {
        self.shared.config()
    }

    pub fn state(&self) -> RunState {
        if self.shared.running.load(Ordering::SeqCst) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Idle → Running. Rejected without side effects when the job is already
    /// running or a setting is missing.
    pub fn start(&self) -> Result<(), StartError> {
        let mut slot = self.worker();
        if self.shared.running.load(Ordering::SeqCst) {
            return Err(StartError::AlreadyRunning);
        }
        self.shared.config().ready()?;

        if let Some(old) = slot.take() {
            // Already exited (running flag is clear); reap it.
            let _ = old.handle.join();
        }

        self.shared.running.store(true, Ordering::SeqCst);
        let token = CancelToken::new();
        let guard = RunningGuard(Arc::clone(&self.shared));
        let worker_token = token.clone();
        let spawned = std::thread::Builder::new()
            .name("snapkeep-job".to_string())
            .spawn(move || {
                let guard = guard;
                cycle::run_loop(&guard.0, &worker_token);
            });
        let handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                // The closure (and its guard) was dropped, which cleared the flag.
                return Err(StartError::Spawn(e));
            }
        };
        *slot = Some(Worker { token, handle });
        Ok(())
    }

    /// Request the loop to stop. Returns immediately; an in-flight fetch finishes first.
    pub fn stop(&self) {
        if let Some(worker) = self.worker().as_ref() {
            worker.token.cancel();
        }
    }

    /// Block until the worker thread has exited. No-op when idle.
    pub fn wait(&self) {
        let worker = self.worker().take();
        if let Some(worker) = worker {
            if worker.handle.join().is_err() {
                tracing::error!("snapshot job worker panicked");
            }
        }
    }
}

impl Drop for SnapshotJob {
    fn drop(&mut self) {
        self.stop();
    }
}

fn checked_url(url: &str) -> Result<String, ConfigError> {
    if url.trim().is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    Ok(validate_source_url(url)?.to_string())
}
