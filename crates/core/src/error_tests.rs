// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for error display formatting.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

#[test]
fn test_invalid_state_includes_hint() {
    let err = Error::InvalidState("bogus".to_string());
    let msg = err.to_string();
    assert!(msg.contains("bogus"));
    assert!(msg.contains("hint"));
}

#[test]
fn test_event_not_found_names_identity() {
    let err = Error::EventNotFound {
        badge_id: "123".to_string(),
        timestamp: "2026-01-01T00:00:00+00:00".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("123"));
    assert!(msg.contains("2026-01-01"));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
}
