//! `snapkeep list` – show the snapshots in a directory.

use anyhow::Result;
use snapkeep_core::retention::list_snapshots;
use std::path::Path;

pub fn run_list(dest: &Path, json: bool) -> Result<()> {
    let snapshots = list_snapshots(dest)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }
    if snapshots.is_empty() {
        println!("No snapshots in {}.", dest.display());
    } else {
        println!("{:<20} {:>12} {}", "TAKEN", "SIZE", "FILE");
        for s in snapshots {
            println!(
                "{:<20} {:>12} {}",
                s.taken_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                s.bytes,
                s.file_name
            );
        }
    }
    Ok(())
}
