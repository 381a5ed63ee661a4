use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default time between two fetch/prune cycles (4 hours).
pub const DEFAULT_INTERVAL_SECS: u64 = 4 * 60 * 60;
/// Default age after which a snapshot is deleted.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;
/// Default re-check delay while the URL or destination is unset.
pub const DEFAULT_CONFIG_BACKOFF_SECS: u64 = 10;

/// Upper bound for `interval_secs` and `config_backoff_secs` (10 years).
pub const MAX_WAIT_SECS: u64 = 10 * 365 * 24 * 60 * 60;
/// Upper bound for `retention_days` (100 years).
pub const MAX_RETENTION_DAYS: u32 = 100 * 366;

/// Transfer tuning for the fetcher (optional `[fetch]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below `low_speed_limit` bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit for one transfer.
    pub timeout_secs: u64,
    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
    /// Optional receive-rate cap in bytes per second (None = no cap).
    #[serde(default)]
    pub max_bytes_per_sec: Option<u64>,
    /// Optional User-Agent header.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            timeout_secs: 3600,
            max_redirects: 10,
            max_bytes_per_sec: None,
            user_agent: None,
        }
    }
}

/// Global configuration loaded from `~/.config/snapkeep/config.toml`.
///
/// Only tuning constants live here; the source URL and destination directory
/// are supplied per run and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapkeepConfig {
    /// Seconds between two cycles.
    pub interval_secs: u64,
    /// Snapshots strictly older than this many days are pruned.
    pub retention_days: u32,
    /// Seconds to wait before re-checking a missing URL or destination.
    pub config_backoff_secs: u64,
    /// Optional transfer tuning; if missing, built-in defaults are used.
    #[serde(default)]
    pub fetch: Option<FetchConfig>,
}

impl Default for SnapkeepConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            retention_days: DEFAULT_RETENTION_DAYS,
            config_backoff_secs: DEFAULT_CONFIG_BACKOFF_SECS,
            fetch: None,
        }
    }
}

/// Timing parameters of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub retention_days: u32,
    pub config_backoff: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        SnapkeepConfig::default().schedule()
    }
}

impl SnapkeepConfig {
    pub fn schedule(&self) -> Schedule {
        Schedule {
            interval: Duration::from_secs(self.interval_secs),
            retention_days: self.retention_days,
            config_backoff: Duration::from_secs(self.config_backoff_secs),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        self.fetch.clone().unwrap_or_default()
    }

    /// Rejects values the loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        check_range("interval_secs", self.interval_secs, MAX_WAIT_SECS)?;
        check_range(
            "retention_days",
            u64::from(self.retention_days),
            u64::from(MAX_RETENTION_DAYS),
        )?;
        check_range("config_backoff_secs", self.config_backoff_secs, MAX_WAIT_SECS)?;
        Ok(())
    }
}

fn check_range(field: &str, value: u64, max: u64) -> Result<()> {
    if value == 0 {
        anyhow::bail!("{field} must be greater than zero");
    }
    if value > max {
        anyhow::bail!("{field} must be at most {max} (got {value})");
    }
    Ok(())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("snapkeep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SnapkeepConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SnapkeepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: SnapkeepConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
