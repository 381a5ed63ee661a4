//! `snapkeep run` – run the periodic job in the foreground until Ctrl-C.

use anyhow::Result;
use snapkeep_core::config::SnapkeepConfig;
use snapkeep_core::fetcher::Fetcher;
use snapkeep_core::scheduler::SnapshotJob;
use std::path::Path;

use super::log_view::{shutdown, spawn_log_printer};

pub async fn run_job(cfg: &SnapkeepConfig, url: &str, dest: &Path) -> Result<()> {
    let (job, rx) = SnapshotJob::new(cfg.schedule(), Fetcher::new(cfg.fetch_config()));
    job.set_config(url, dest)?;
    let printer = spawn_log_printer(rx);

    if let Err(e) = job.start() {
        eprintln!("start rejected: {}", e);
        shutdown(job, printer).await?;
        return Err(e.into());
    }
    tracing::info!(
        url,
        dest = %dest.display(),
        interval_secs = cfg.interval_secs,
        retention_days = cfg.retention_days,
        "snapshot job running"
    );

    tokio::signal::ctrl_c().await?;
    println!("stopping (an in-flight fetch is allowed to finish)...");
    shutdown(job, printer).await
}
