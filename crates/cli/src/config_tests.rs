// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn test_db_path_defaults_to_punches_db() {
    let temp = TempDir::new().unwrap();
    let db_path = get_db_path(temp.path()).unwrap();
    assert_eq!(db_path, temp.path().join("punches.db"));
}

#[test]
fn test_db_path_reads_config_toml() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        "endpoint_url = \"https://hr.example.com/punch\"\ndb_path = \"scans.db\"\n",
    )
    .unwrap();

    let db_path = get_db_path(temp.path()).unwrap();
    assert_eq!(db_path, temp.path().join("scans.db"));
}

#[test]
fn test_db_path_absolute_override() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "db_path = \"/var/lib/punch.db\"\n").unwrap();

    let db_path = get_db_path(temp.path()).unwrap();
    assert_eq!(db_path, PathBuf::from("/var/lib/punch.db"));
}

#[test]
fn test_daemon_only_keys_are_ignored() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        "endpoint_url = \"https://hr.example.com/punch\"\nmax_retry_attempts = 5\n",
    )
    .unwrap();

    let db_path = get_db_path(temp.path()).unwrap();
    assert_eq!(db_path, temp.path().join("punches.db"));
}

#[test]
fn test_open_store_creates_state_dir() {
    let temp = TempDir::new().unwrap();
    let state_dir = temp.path().join("nested").join("state");
    let store = open_store(&state_dir).unwrap();
    assert_eq!(store.count_pending().unwrap(), 0);
    assert!(state_dir.join("punches.db").exists());
}
