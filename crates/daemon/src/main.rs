// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! punchd - The punchclock sync daemon binary.
//!
//! Reads `config.toml` from the state directory, acquires the single-instance
//! lock, and runs the sync engine until interrupted.
//!
//! Usage:
//!   punchd --state-dir <path>

use std::fs;
use std::path::{Path, PathBuf};

use punchd::config::{default_state_dir, Config};
use punchd::runner;

/// PID filename within the state directory.
const PID_NAME: &str = "daemon.pid";
/// Lock filename for single instance guarantee.
const LOCK_NAME: &str = "daemon.lock";
/// Log filename within the state directory.
const LOG_NAME: &str = "daemon.log";

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let state_dir = parse_state_dir(&args);

    if let Err(e) = fs::create_dir_all(&state_dir) {
        eprintln!("error: cannot create state dir {}: {}", state_dir.display(), e);
        std::process::exit(1);
    }

    setup_logging(&state_dir.join(LOG_NAME));
    tracing::info!("punchd starting, state_dir={}", state_dir.display());

    let config = match Config::load(&state_dir) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to load config: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // Acquire file lock for single instance
    let lock_path = state_dir.join(LOCK_NAME);
    let _lock_file = match acquire_lock(&lock_path) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("failed to acquire lock: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    // Write PID file
    let pid_path = state_dir.join(PID_NAME);
    if let Err(e) = write_pid_file(&pid_path) {
        tracing::error!("failed to write PID file: {}", e);
        std::process::exit(1);
    }

    let result = runner::run_daemon(&state_dir, &config);

    let _ = fs::remove_file(&pid_path);
    if let Err(e) = result {
        tracing::error!("daemon exited with error: {}", e);
        std::process::exit(1);
    }
    tracing::info!("punchd stopped");
}

fn parse_state_dir(args: &[String]) -> PathBuf {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--state-dir" {
            if let Some(dir) = iter.next() {
                return PathBuf::from(dir);
            }
        }
    }
    default_state_dir()
}

fn setup_logging(log_path: &Path) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn acquire_lock(lock_path: &Path) -> std::io::Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|_| std::io::Error::other("another punchd instance is already running"))?;
    Ok(file)
}

fn write_pid_file(pid_path: &Path) -> std::io::Result<()> {
    fs::write(pid_path, format!("{}", std::process::id()))
}
