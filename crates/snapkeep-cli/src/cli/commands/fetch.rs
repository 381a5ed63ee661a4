//! `snapkeep fetch` – fetch one snapshot now.

use anyhow::Result;
use snapkeep_core::config::SnapkeepConfig;
use snapkeep_core::fetcher::Fetcher;
use std::path::Path;

pub async fn run_fetch(cfg: &SnapkeepConfig, url: &str, dest: &Path) -> Result<()> {
    let fetcher = Fetcher::new(cfg.fetch_config());
    let url = url.to_string();
    let dest = dest.to_path_buf();
    let snapshot = tokio::task::spawn_blocking(move || fetcher.fetch(&url, &dest)).await??;
    println!("{} ({} bytes)", snapshot.path.display(), snapshot.bytes);
    Ok(())
}
