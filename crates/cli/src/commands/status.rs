// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `punch status` - queue counts plus daemon state.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::{open_store, punch_state_dir};
use crate::daemon;
use crate::error::Result;

/// Show the queue and daemon status.
pub fn run(format: OutputFormat) -> Result<()> {
    let state_dir = punch_state_dir();
    let store = open_store(&state_dir)?;

    let pending = store.count_pending()?;
    let dead = store.count_dead()?;
    let last_confirmed = store.last_confirmed_delivery()?;
    let daemon_status = daemon::get_daemon_status(&state_dir).unwrap_or(None);

    match format {
        OutputFormat::Json => {
            let value = json!({
                "pending": pending,
                "dead": dead,
                "last_confirmed_delivery": last_confirmed,
                "daemon": daemon_status,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("Pending scans: {}", pending);
            println!("Dead-lettered: {}", dead);
            println!(
                "Last confirmed delivery: {}",
                format_time(last_confirmed.as_ref())
            );
            match daemon_status {
                Some(status) => {
                    println!("Daemon: running (PID {}, up {}s)", status.pid, status.uptime_secs);
                    if let Some(outcome) = &status.last_sync {
                        println!("Last sync: {}", super::sync::describe_outcome(outcome));
                    }
                }
                None => println!("Daemon: not running"),
            }
        }
    }

    Ok(())
}

fn format_time(ts: Option<&DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => "never".to_string(),
    }
}
