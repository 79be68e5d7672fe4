// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `punch record` - commit a badge scan to the local store.
//!
//! This is the hot path at the terminal: the scan is durable the moment
//! this command returns, whether or not the daemon is running or the
//! network is up.

use chrono::{DateTime, SecondsFormat, Utc};
use pc_core::{EventId, EventStore};

use crate::config::{open_store, punch_state_dir};
use crate::error::{Error, Result};

/// Record a badge scan.
pub fn run(badge_id: &str, at: Option<&str>) -> Result<()> {
    let timestamp = match at {
        Some(s) => parse_at(s)?,
        None => Utc::now(),
    };

    let store = open_store(&punch_state_dir())?;
    let id = record(&store, badge_id, timestamp)?;

    println!(
        "Recorded badge {} at {}",
        id.badge_id,
        id.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    Ok(())
}

/// Append one scan to the store.
///
/// The store treats badge ids as opaque; rejecting blank input is this
/// command's job.
pub fn record(store: &EventStore, badge_id: &str, timestamp: DateTime<Utc>) -> Result<EventId> {
    let badge_id = badge_id.trim();
    if badge_id.is_empty() {
        return Err(Error::InvalidArgument("badge id cannot be empty".to_string()));
    }
    Ok(store.append(badge_id, timestamp)?)
}

fn parse_at(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidArgument(format!("--at must be RFC 3339: {}", e)))
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
