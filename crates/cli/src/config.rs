// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! State directory and database resolution for the CLI.
//!
//! The CLI and the daemon share one state directory. The daemon owns the
//! full `config.toml`; the CLI only needs the `db_path` key from it so
//! that `punch record` appends into the same database the daemon drains.

use std::path::{Path, PathBuf};

use pc_core::EventStore;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Database filename within the state directory.
const DB_FILE_NAME: &str = "punches.db";
/// Config filename within the state directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "PUNCH_STATE_DIR";

/// The subset of the daemon config the CLI cares about.
#[derive(Debug, Default, Deserialize)]
struct SharedConfig {
    db_path: Option<String>,
}

/// Resolve the state directory shared with the daemon.
///
/// Honors `PUNCH_STATE_DIR`, then falls back to the platform state
/// directory (`~/.local/state/punchclock` on Linux).
pub fn punch_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("punchclock"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve the database path for the given state directory.
///
/// Reads `db_path` from `config.toml` if present; unknown keys in the
/// config (the daemon's) are ignored.
pub fn get_db_path(state_dir: &Path) -> Result<PathBuf> {
    let config_path = state_dir.join(CONFIG_FILE_NAME);
    let shared = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        toml_lenient(&content)?
    } else {
        SharedConfig::default()
    };

    Ok(match shared.db_path {
        Some(p) => {
            let path = Path::new(&p);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                state_dir.join(path)
            }
        }
        None => state_dir.join(DB_FILE_NAME),
    })
}

fn toml_lenient(content: &str) -> Result<SharedConfig> {
    // Deny unknown fields is off by default; the daemon's other keys pass through.
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// Open the shared event store, creating the state directory if needed.
pub fn open_store(state_dir: &Path) -> Result<EventStore> {
    std::fs::create_dir_all(state_dir)?;
    let db_path = get_db_path(state_dir)?;
    Ok(EventStore::open(&db_path)?)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
