// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_store_error_display_is_transparent() {
    let inner = pc_core::Error::InvalidState("bogus".to_string());
    let message = inner.to_string();
    let err = Error::Store(inner);
    assert_eq!(err.to_string(), message);
}

#[test]
fn test_daemon_error_display() {
    let err = Error::Daemon("connection refused".to_string());
    assert_eq!(err.to_string(), "daemon: connection refused");
}

#[test]
fn test_invalid_argument_display() {
    let err = Error::InvalidArgument("bad timestamp".to_string());
    assert_eq!(err.to_string(), "invalid argument: bad timestamp");
}
