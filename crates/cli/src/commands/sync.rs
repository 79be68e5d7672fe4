// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `punch sync` - force an immediate flush through the daemon.

use pc_ipc::SyncOutcome;

use crate::config::punch_state_dir;
use crate::daemon;
use crate::error::Result;

/// Ask the daemon to flush the queue now and report the outcome.
pub fn run() -> Result<()> {
    let outcome = daemon::sync_now(&punch_state_dir())?;
    println!("{}", describe_outcome(&outcome));
    Ok(())
}

/// Human-readable one-liner for a sync outcome.
pub(crate) fn describe_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Completed(summary) => format!(
            "completed: {} attempted, {} delivered, {} requeued, {} dead-lettered",
            summary.attempted, summary.delivered, summary.requeued, summary.dead_lettered
        ),
        SyncOutcome::Offline => "skipped: terminal is offline".to_string(),
        SyncOutcome::Busy => "skipped: a flush is already in progress".to_string(),
        SyncOutcome::TooSoon => "skipped: minimum sync interval not yet elapsed".to_string(),
        SyncOutcome::Failed { message } => format!("failed: {}", message),
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
