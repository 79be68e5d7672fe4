// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `punch dead` - inspect or clear dead-lettered scans.
//!
//! Dead-lettered scans stay in the store until an operator clears them;
//! the daemon never touches them again.

use chrono::SecondsFormat;
use pc_core::EventStore;

use crate::cli::OutputFormat;
use crate::config::{open_store, punch_state_dir};
use crate::error::Result;

/// List dead-lettered scans.
pub fn list(format: OutputFormat) -> Result<()> {
    let store = open_store(&punch_state_dir())?;
    let events = store.list_dead()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Text => {
            if events.is_empty() {
                println!("No dead-lettered scans.");
                return Ok(());
            }
            for event in &events {
                println!(
                    "{}  {}  ({} attempts)",
                    event.badge_id,
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    event.attempts
                );
            }
        }
    }

    Ok(())
}

/// Delete all dead-lettered scans.
pub fn clear() -> Result<()> {
    let store = open_store(&punch_state_dir())?;
    let removed = clear_store(&store)?;
    println!("Cleared {} dead-lettered scan(s).", removed);
    Ok(())
}

/// Remove every dead-lettered row, returning how many were removed.
pub fn clear_store(store: &EventStore) -> Result<usize> {
    Ok(store.clear_dead()?)
}

#[cfg(test)]
#[path = "dead_tests.rs"]
mod tests;
