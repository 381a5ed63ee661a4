//! CLI for snapkeep: the control surface of the snapshot job.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use snapkeep_core::config::{self, SnapkeepConfig};
use std::path::PathBuf;

use commands::{run_console, run_fetch, run_job, run_list, run_prune};

/// Top-level CLI for snapkeep.
#[derive(Debug, Parser)]
#[command(name = "snapkeep")]
#[command(
    about = "snapkeep: periodically snapshot a remote file and keep a rolling retention window",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides for the values in config.toml.
#[derive(Debug, Clone, Default, Args)]
pub struct ScheduleArgs {
    /// Seconds between two fetch/prune cycles.
    #[arg(long, value_name = "SECS")]
    pub interval_secs: Option<u64>,
    /// Delete snapshots older than this many days.
    #[arg(long, value_name = "DAYS")]
    pub retention_days: Option<u32>,
    /// Seconds between re-checks while the URL or destination is unset.
    #[arg(long, value_name = "SECS")]
    pub config_backoff_secs: Option<u64>,
}

impl ScheduleArgs {
    pub fn apply(&self, cfg: &mut SnapkeepConfig) -> Result<()> {
        if let Some(v) = self.interval_secs {
            cfg.interval_secs = v;
        }
        if let Some(v) = self.retention_days {
            cfg.retention_days = v;
        }
        if let Some(v) = self.config_backoff_secs {
            cfg.config_backoff_secs = v;
        }
        cfg.validate()
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the periodic job in the foreground until Ctrl-C.
    Run {
        /// HTTP/HTTPS URL of the file to snapshot.
        #[arg(long)]
        url: String,
        /// Directory that holds the snapshots (created if missing).
        #[arg(long)]
        dest: PathBuf,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Interactive control panel on stdin: set URL/destination, start, stop, watch the log.
    Console {
        /// Initial source URL.
        #[arg(long)]
        url: Option<String>,
        /// Initial destination directory.
        #[arg(long)]
        dest: Option<PathBuf>,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },

    /// Fetch one snapshot now.
    Fetch {
        /// HTTP/HTTPS URL of the file to snapshot.
        #[arg(long)]
        url: String,
        /// Directory that holds the snapshots (created if missing).
        #[arg(long)]
        dest: PathBuf,
    },

    /// Delete expired snapshots now.
    Prune {
        /// Directory that holds the snapshots.
        #[arg(long)]
        dest: PathBuf,
        /// Delete snapshots older than this many days (default from config).
        #[arg(long, value_name = "DAYS")]
        retention_days: Option<u32>,
    },

    /// List the snapshots in a directory, oldest first.
    List {
        /// Directory that holds the snapshots.
        #[arg(long)]
        dest: PathBuf,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                url,
                dest,
                schedule,
            } => {
                schedule.apply(&mut cfg)?;
                run_job(&cfg, &url, &dest).await?;
            }
            CliCommand::Console {
                url,
                dest,
                schedule,
            } => {
                schedule.apply(&mut cfg)?;
                run_console(&cfg, url.as_deref(), dest).await?;
            }
            CliCommand::Fetch { url, dest } => run_fetch(&cfg, &url, &dest).await?,
            CliCommand::Prune {
                dest,
                retention_days,
            } => {
                if let Some(days) = retention_days {
                    cfg.retention_days = days;
                }
                cfg.validate()?;
                run_prune(&dest, cfg.retention_days)?;
            }
            CliCommand::List { dest, json } => run_list(&dest, json)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
