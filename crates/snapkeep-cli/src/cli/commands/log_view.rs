//! Prints the job log to the terminal as it arrives.

use snapkeep_core::scheduler::{LogLevel, LogReceiver, SnapshotJob};
use tokio::task::JoinHandle;

/// Forwards every log entry to stdout (failures to stderr) until the job is dropped.
pub fn spawn_log_printer(mut rx: LogReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            match entry.level() {
                LogLevel::Info => println!("{}", entry),
                LogLevel::Warn | LogLevel::Error => eprintln!("{}", entry),
            }
        }
    })
}

/// Stops the job, waits for the worker off the async runtime, then drains the log.
pub async fn shutdown(job: SnapshotJob, printer: JoinHandle<()>) -> anyhow::Result<()> {
    job.stop();
    tokio::task::spawn_blocking(move || {
        job.wait();
        drop(job);
    })
    .await?;
    printer.await?;
    Ok(())
}
