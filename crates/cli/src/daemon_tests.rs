// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn test_paths_live_in_state_dir() {
    let dir = Path::new("/tmp/punch-state");
    assert_eq!(get_socket_path(dir), dir.join("daemon.sock"));
    assert_eq!(get_pid_path(dir), dir.join("daemon.pid"));
}

#[test]
fn test_detect_without_socket_returns_none() {
    let temp = TempDir::new().unwrap();
    assert!(detect_daemon(temp.path()).unwrap().is_none());
}

#[test]
fn test_detect_cleans_stale_pid_file() {
    let temp = TempDir::new().unwrap();
    let pid_path = get_pid_path(temp.path());
    fs::write(&pid_path, "12345").unwrap();

    assert!(detect_daemon(temp.path()).unwrap().is_none());
    assert!(!pid_path.exists());
}

#[test]
fn test_detect_cleans_dead_socket() {
    let temp = TempDir::new().unwrap();
    let socket_path = get_socket_path(temp.path());
    // A plain file where the socket should be: connect fails, files get removed
    fs::write(&socket_path, "").unwrap();
    fs::write(get_pid_path(temp.path()), "12345").unwrap();

    assert!(detect_daemon(temp.path()).unwrap().is_none());
    assert!(!socket_path.exists());
    assert!(!get_pid_path(temp.path()).exists());
}

#[test]
fn test_stop_without_daemon_is_an_error() {
    let temp = TempDir::new().unwrap();
    assert!(stop_daemon(temp.path()).is_err());
}

#[test]
fn test_sync_without_daemon_is_an_error() {
    let temp = TempDir::new().unwrap();
    assert!(sync_now(temp.path()).is_err());
}

#[test]
fn test_status_without_socket_returns_none() {
    let temp = TempDir::new().unwrap();
    assert!(get_daemon_status(temp.path()).unwrap().is_none());
}
