//! Application settings loaded from `config.toml`.
//!
//! Every section and field has a default, so a missing file yields a working
//! configuration. A file that exists but cannot be parsed is an error.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// When the daily recurrence job runs
    pub scheduler: SchedulerConfig,
    /// Dashboard list sizes and default window
    pub dashboard: DashboardConfig,
}

/// Settings for the daily recurrence job
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Hour of the day (UTC, 0-23) at which the job fires
    pub run_hour_utc: u32,
    /// Whether to run once immediately at startup
    pub run_on_startup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            run_hour_utc: 0,
            run_on_startup: true,
        }
    }
}

/// Settings for dashboard composition
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Number of top categories and recent items in a user summary
    pub user_limit: usize,
    /// Number of top categories and recent items in the admin summary
    pub admin_limit: usize,
    /// Length of the default date range, in months back from now
    pub default_range_months: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            user_limit: 5,
            admin_limit: 10,
            default_range_months: 3,
        }
    }
}

impl AppConfig {
    fn validate(self) -> Result<Self> {
        if self.scheduler.run_hour_utc > 23 {
            return Err(Error::Config {
                message: format!(
                    "scheduler.run_hour_utc must be between 0 and 23, got {}",
                    self.scheduler.run_hour_utc
                ),
            });
        }
        Ok(self)
    }
}

/// Parses settings from a TOML string.
///
/// # Errors
/// Returns `Error::Config` if the TOML syntax is invalid or a value is out of range.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()
}

/// Loads settings from a TOML file, falling back to defaults when it does not exist.
///
/// # Errors
/// Returns an error if:
/// - The file exists but cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("No config file at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads settings from the default location (./config.toml)
pub fn load_default_config() -> Result<AppConfig> {
    load_config("config.toml")
}
