// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use pc_ipc::SyncSummary;

#[test]
fn test_describe_completed() {
    let outcome = SyncOutcome::Completed(SyncSummary {
        attempted: 4,
        delivered: 3,
        requeued: 1,
        dead_lettered: 0,
    });
    assert_eq!(
        describe_outcome(&outcome),
        "completed: 4 attempted, 3 delivered, 1 requeued, 0 dead-lettered"
    );
}

#[test]
fn test_describe_offline() {
    assert_eq!(
        describe_outcome(&SyncOutcome::Offline),
        "skipped: terminal is offline"
    );
}

#[test]
fn test_describe_failed() {
    let outcome = SyncOutcome::Failed {
        message: "disk full".to_string(),
    };
    assert_eq!(describe_outcome(&outcome), "failed: disk full");
}
