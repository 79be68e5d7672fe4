// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management commands.
//!
//! Commands for controlling the punchd daemon that drains the scan queue.

use crate::config::punch_state_dir;
use crate::daemon;
use crate::error::{Error, Result};

/// Show daemon status.
pub fn status() -> Result<()> {
    let state_dir = punch_state_dir();

    match daemon::get_daemon_status(&state_dir) {
        Ok(Some(status)) => {
            println!("Status: running");
            println!("PID: {}", status.pid);
            println!("Uptime: {}s", status.uptime_secs);
            println!("Pending scans: {}", status.pending);
            println!("Dead-lettered: {}", status.dead);
        }
        Ok(None) => {
            println!("Status: not running");
        }
        Err(e) => {
            println!("Status: error ({})", e);
        }
    }

    Ok(())
}

/// Stop the daemon.
pub fn stop() -> Result<()> {
    let state_dir = punch_state_dir();

    if daemon::detect_daemon(&state_dir)?.is_none() {
        println!("Daemon is not running.");
        return Ok(());
    }

    match daemon::stop_daemon(&state_dir) {
        Ok(()) => {
            println!("Daemon stopped.");
        }
        Err(e) => {
            println!("Failed to stop daemon: {}", e);
        }
    }

    Ok(())
}

/// Start the daemon.
pub fn start() -> Result<()> {
    let state_dir = punch_state_dir();

    match daemon::detect_daemon(&state_dir)? {
        Some(info) => {
            println!("Daemon is already running (PID: {})", info.pid);
        }
        None => match daemon::spawn_daemon(&state_dir) {
            Ok(info) => {
                println!("Daemon started (PID: {})", info.pid);
            }
            Err(e) => {
                return Err(Error::Daemon(format!("failed to start daemon: {}", e)));
            }
        },
    }

    Ok(())
}

/// View daemon logs.
pub fn logs(follow: bool) -> Result<()> {
    let state_dir = punch_state_dir();
    let log_path = state_dir.join("daemon.log");

    if !log_path.exists() {
        println!("No daemon logs found at {}", log_path.display());
        return Ok(());
    }

    if follow {
        let status = std::process::Command::new("tail")
            .arg("-f")
            .arg(&log_path)
            .status()?;

        if !status.success() {
            return Err(Error::Io(std::io::Error::other("tail command failed")));
        }
    } else {
        let content = std::fs::read_to_string(&log_path)?;
        print!("{}", content);
    }

    Ok(())
}
