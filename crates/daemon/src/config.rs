// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration management.
//!
//! Configuration is stored in `config.toml` inside the state directory and
//! covers everything an operator must be able to set: the remote endpoint,
//! sync cadence, retry policy, and delivery mode. Only `endpoint_url` is
//! required; every other field has a default matching the terminal's
//! historical behavior.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Config filename within the state directory.
const CONFIG_FILE_NAME: &str = "config.toml";
/// Database filename within the state directory.
const DB_FILE_NAME: &str = "punches.db";

/// How pending events are handed to the delivery client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    /// One HTTP call per pending event.
    PerRecord,
    /// All selected events in a single HTTP call.
    Batch,
}

/// Which pending events a batch flush selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchWindow {
    /// Every pending event.
    All,
    /// Only events from the last completed clock hour.
    LastHour,
}

/// Daemon configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote HR endpoint receiving scan events (http or https).
    pub endpoint_url: String,
    /// Well-known URL used as a connectivity liveness signal.
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    /// Minimum seconds between flush attempts (default 900 = 15 minutes).
    #[serde(default = "default_min_sync_interval_secs")]
    pub min_sync_interval_secs: u64,
    /// Seconds between scheduler wake-ups (default 60).
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Maximum delivery attempts per event before dead-lettering (default 3).
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Exponential backoff base in seconds (default 2).
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    /// Per-record or batch delivery (default per-record).
    #[serde(default = "default_delivery_mode")]
    pub delivery_mode: DeliveryMode,
    /// Batch selection window (default all; only used in batch mode).
    #[serde(default = "default_batch_window")]
    pub batch_window: BatchWindow,
    /// Timeout for each delivery HTTP call in seconds (default 10).
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Timeout for the connectivity probe in seconds (default 5).
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Maximum seconds granted to the final flush on shutdown (default 20).
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Optional database path override (relative to state dir or absolute).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

fn default_min_sync_interval_secs() -> u64 {
    900
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    2
}

fn default_delivery_mode() -> DeliveryMode {
    DeliveryMode::PerRecord
}

fn default_batch_window() -> BatchWindow {
    BatchWindow::All
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_shutdown_grace_secs() -> u64 {
    20
}

impl Config {
    /// Load configuration from `config.toml` in the given state directory.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = state_dir.join(CONFIG_FILE_NAME);
        let contents = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values that serde cannot check.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("endpoint_url", &self.endpoint_url), ("probe_url", &self.probe_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "invalid {} '{}': must start with http:// or https://",
                    name, url
                )));
            }
        }
        if self.max_retry_attempts == 0 {
            return Err(Error::Config(
                "max_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.tick_interval_secs == 0 {
            return Err(Error::Config("tick_interval_secs cannot be 0".to_string()));
        }
        Ok(())
    }

    /// Resolve the database path for the given state directory.
    pub fn db_path(&self, state_dir: &Path) -> PathBuf {
        match &self.db_path {
            Some(p) => {
                let path = Path::new(p);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    state_dir.join(path)
                }
            }
            None => state_dir.join(DB_FILE_NAME),
        }
    }

    /// Minimum inter-sync interval as a [`Duration`].
    pub fn min_sync_interval(&self) -> Duration {
        Duration::from_secs(self.min_sync_interval_secs)
    }

    /// Scheduler tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Default state directory: `~/.local/state/punchclock` (or platform
/// equivalent), falling back to the current directory.
pub fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("punchclock"))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
