// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pc-core - Durable store for the punchclock terminal.
//!
//! This crate holds the shared pieces of the time-clock sync engine:
//!
//! - [`Event`] / [`EventId`] / [`EventState`] - the badge-scan event model
//! - [`EventStore`] - crash-safe SQLite storage for pending and dead events
//! - [`Error`] - error types for all operations
//!
//! The store is the only shared mutable resource between the foreground
//! append path (one row per scan) and the background flush path (the daemon).
//! Both open the same database file; WAL mode keeps them from blocking each
//! other.

pub mod error;
pub mod event;
pub mod store;

pub use error::{Error, Result};
pub use event::{Event, EventId, EventState};
pub use store::{AuditRow, EventStore};
