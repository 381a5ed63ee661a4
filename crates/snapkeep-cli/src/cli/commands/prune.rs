//! `snapkeep prune` – delete expired snapshots now.

use anyhow::Result;
use chrono::Local;
use snapkeep_core::retention;
use std::path::Path;

pub fn run_prune(dest: &Path, retention_days: u32) -> Result<()> {
    let report = retention::prune(dest, retention_days, Local::now().naive_local())?;
    for failure in &report.failures {
        eprintln!("skipped {}", failure);
    }
    println!("{}", report.summary());
    Ok(())
}
