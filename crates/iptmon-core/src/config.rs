//! Configuration management for iptmon.
//!
//! Loads defaults from ${IPTMON_HOME}/config.toml. Command-line flags are
//! layered on top by the CLI, and the merged result is validated into
//! [`MonitorSettings`] before any sampling happens.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::error::StartupError;
use crate::paths;
use crate::sample_log::LogFormat;
use crate::schedule::TickPolicy;
use crate::source::IptablesCommand;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chain to list rules from.
    pub chain: String,
    /// Seconds between samples.
    pub refresh_secs: f64,
    /// Program used to list rules.
    pub iptables: String,
    /// Optional `-t` table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub schedule: TickPolicy,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chain: Self::DEFAULT_CHAIN.to_string(),
            refresh_secs: Self::DEFAULT_REFRESH_SECS,
            iptables: Self::DEFAULT_IPTABLES.to_string(),
            table: None,
            schedule: TickPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

impl Config {
    pub const DEFAULT_CHAIN: &str = "INPUT";
    pub const DEFAULT_REFRESH_SECS: f64 = 1.0;
    pub const DEFAULT_IPTABLES: &str = "iptables";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init_at(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

/// Where and how the sample log is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub path: PathBuf,
    pub format: LogFormat,
}

/// Fully resolved, validated settings for one monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub chain: String,
    pub table: Option<String>,
    pub iptables: String,
    pub position: usize,
    pub period: Duration,
    pub schedule: TickPolicy,
    pub log: Option<LogTarget>,
}

impl MonitorSettings {
    /// Validates the refresh period and the lower bound of `position`.
    ///
    /// The upper bound needs a listing and is checked by the caller.
    ///
    /// # Errors
    /// Returns [`StartupError::InvalidRefresh`] for non-positive or non-finite
    /// periods and [`StartupError::InvalidPosition`] for positions below 1.
    pub fn validate(
        config: &Config,
        position: i64,
        log: Option<LogTarget>,
    ) -> Result<Self, StartupError> {
        let period = refresh_period(config.refresh_secs)?;
        let position = usize::try_from(position)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(StartupError::InvalidPosition {
                position,
                available: 0,
            })?;
        Ok(Self {
            chain: config.chain.clone(),
            table: config.table.clone(),
            iptables: config.iptables.clone(),
            position,
            period,
            schedule: config.schedule,
            log,
        })
    }

    /// Checks `position` against the current listing size.
    ///
    /// # Errors
    /// Returns [`StartupError::NoRules`] for an empty listing and
    /// [`StartupError::InvalidPosition`] when the position is past the end.
    pub fn check_position(&self, available: usize) -> Result<(), StartupError> {
        if available == 0 {
            return Err(StartupError::NoRules {
                chain: self.chain.clone(),
            });
        }
        if self.position > available {
            return Err(StartupError::InvalidPosition {
                position: i64::try_from(self.position).unwrap_or(i64::MAX),
                available,
            });
        }
        Ok(())
    }

    pub fn listing_command(&self) -> IptablesCommand {
        IptablesCommand::new(&self.iptables, self.table.clone(), &self.chain)
    }
}

/// Converts a refresh interval in seconds into a strictly positive duration.
///
/// # Errors
/// Returns [`StartupError::InvalidRefresh`] unless `secs` is finite and at
/// least one nanosecond.
pub fn refresh_period(secs: f64) -> Result<Duration, StartupError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(StartupError::InvalidRefresh(secs));
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(StartupError::InvalidRefresh(secs)),
    }
}
