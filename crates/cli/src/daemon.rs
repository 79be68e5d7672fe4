// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: spawn, detect, request, stop.
//!
//! The daemon (punchd) is spawned as a background process and communicates
//! via Unix socket. PID and socket files live in the state directory.

use std::fs;
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use pc_ipc::{framing, DaemonRequest, DaemonResponse, DaemonStatus, SyncOutcome};

use crate::error::{Error, Result};

/// Socket filename within the state directory.
const SOCKET_NAME: &str = "daemon.sock";
/// PID filename within the state directory.
const PID_NAME: &str = "daemon.pid";

/// Connection timeout for daemon communication.
const TIMEOUT: Duration = Duration::from_secs(5);
/// Sync requests may block on live HTTP retries, so they get longer.
const SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Information about a running daemon.
#[derive(Debug, Clone)]
pub struct DaemonInfo {
    /// Process ID of the daemon.
    pub pid: u32,
}

/// Get the socket path for the given state directory.
pub fn get_socket_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SOCKET_NAME)
}

/// Get the PID file path for the given state directory.
pub fn get_pid_path(state_dir: &Path) -> PathBuf {
    state_dir.join(PID_NAME)
}

/// Detect if a daemon is running for the given state directory.
///
/// Returns Some(DaemonInfo) if a daemon is running and responding,
/// None otherwise. Cleans up stale PID/socket files if found.
pub fn detect_daemon(state_dir: &Path) -> Result<Option<DaemonInfo>> {
    let socket_path = get_socket_path(state_dir);
    let pid_path = get_pid_path(state_dir);

    if !socket_path.exists() {
        if pid_path.exists() {
            let _ = fs::remove_file(&pid_path);
        }
        return Ok(None);
    }

    match connect(&socket_path, TIMEOUT) {
        Ok(mut stream) => {
            if framing::write_request(&mut stream, &DaemonRequest::Ping).is_err() {
                cleanup_stale_files(state_dir);
                return Ok(None);
            }
            match framing::read_response(&mut stream) {
                Ok(DaemonResponse::Pong) => match read_pid_file(&pid_path) {
                    Some(pid) if pid > 0 => Ok(Some(DaemonInfo { pid })),
                    // PID file missing or invalid - daemon may be starting up
                    _ => Ok(None),
                },
                _ => {
                    cleanup_stale_files(state_dir);
                    Ok(None)
                }
            }
        }
        Err(_) => {
            cleanup_stale_files(state_dir);
            Ok(None)
        }
    }
}

/// Get daemon status by connecting to the daemon.
pub fn get_daemon_status(state_dir: &Path) -> Result<Option<DaemonStatus>> {
    let socket_path = get_socket_path(state_dir);
    if !socket_path.exists() {
        return Ok(None);
    }

    let mut stream = match connect(&socket_path, TIMEOUT) {
        Ok(s) => s,
        Err(_) => {
            cleanup_stale_files(state_dir);
            return Ok(None);
        }
    };

    framing::write_request(&mut stream, &DaemonRequest::Status)?;
    match framing::read_response(&mut stream)? {
        DaemonResponse::Status(status) => Ok(Some(status)),
        DaemonResponse::Error { message } => Err(Error::Daemon(message)),
        other => Err(Error::Daemon(format!("unexpected response: {:?}", other))),
    }
}

/// Ask the daemon for an immediate flush and wait for the outcome.
pub fn sync_now(state_dir: &Path) -> Result<SyncOutcome> {
    let socket_path = get_socket_path(state_dir);
    if !socket_path.exists() {
        return Err(Error::Daemon("daemon is not running".to_string()));
    }

    let mut stream = connect(&socket_path, SYNC_TIMEOUT)
        .map_err(|e| Error::Daemon(format!("failed to connect to daemon: {}", e)))?;

    framing::write_request(&mut stream, &DaemonRequest::SyncNow)?;
    match framing::read_response(&mut stream)? {
        DaemonResponse::Sync(outcome) => Ok(outcome),
        DaemonResponse::Error { message } => Err(Error::Daemon(message)),
        other => Err(Error::Daemon(format!("unexpected response: {:?}", other))),
    }
}

/// Send a shutdown request to the daemon.
pub fn stop_daemon(state_dir: &Path) -> Result<()> {
    let socket_path = get_socket_path(state_dir);
    if !socket_path.exists() {
        return Err(Error::Daemon("daemon is not running".to_string()));
    }

    let mut stream = connect(&socket_path, TIMEOUT)?;
    framing::write_request(&mut stream, &DaemonRequest::Shutdown)?;
    match framing::read_response(&mut stream)? {
        DaemonResponse::ShuttingDown => Ok(()),
        DaemonResponse::Error { message } => Err(Error::Daemon(message)),
        other => Err(Error::Daemon(format!("unexpected response: {:?}", other))),
    }
}

/// Spawn a new daemon process for the given state directory.
///
/// Returns the DaemonInfo for the spawned daemon. The daemon itself holds
/// a file lock, so a racing second spawn resolves to the surviving instance.
pub fn spawn_daemon(state_dir: &Path) -> Result<DaemonInfo> {
    if let Some(info) = detect_daemon(state_dir)? {
        return Ok(info);
    }

    fs::create_dir_all(state_dir)?;

    let punchd_path = find_punchd_binary();
    let mut child = Command::new(&punchd_path)
        .arg("--state-dir")
        .arg(state_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            Error::Daemon(format!(
                "failed to start punchd ({}): {}",
                punchd_path.display(),
                e
            ))
        })?;

    // Wait for the daemon to signal readiness ("READY" on stdout)
    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            match line {
                Ok(line) if line == "READY" => break,
                Ok(_) => continue,
                Err(_) => break,
            }
        }
    }

    // Verify the daemon is answering, with short polling
    for _ in 0..150 {
        if let Ok(Some(exit)) = child.try_wait() {
            return Err(Error::Daemon(format!(
                "punchd exited during startup ({})",
                exit
            )));
        }
        if let Some(info) = detect_daemon(state_dir)? {
            return Ok(info);
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    Err(Error::Daemon(
        "punchd did not become ready in time".to_string(),
    ))
}

/// Find the punchd binary.
fn find_punchd_binary() -> PathBuf {
    // 1. Check PUNCH_DAEMON_BINARY env var
    if let Ok(path) = std::env::var("PUNCH_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // 2. Look next to the current executable
    if let Ok(exe) = std::env::current_exe() {
        let punchd = exe.with_file_name("punchd");
        if punchd.exists() {
            return punchd;
        }
    }

    // 3. Fall back to PATH
    PathBuf::from("punchd")
}

fn connect(socket_path: &Path, timeout: Duration) -> std::io::Result<UnixStream> {
    let stream = UnixStream::connect(socket_path)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(TIMEOUT))?;
    Ok(stream)
}

fn read_pid_file(pid_path: &Path) -> Option<u32> {
    fs::read_to_string(pid_path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

fn cleanup_stale_files(state_dir: &Path) {
    let _ = fs::remove_file(get_socket_path(state_dir));
    let _ = fs::remove_file(get_pid_path(state_dir));
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
