// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! punchd - The punchclock sync daemon.
//!
//! Owns the store-and-forward delivery engine for the badge-scan terminal:
//!
//! - [`scheduler`] - the control loop deciding when a flush is allowed
//! - [`retry`] - bounded exponential-backoff retry around one delivery
//! - [`delivery`] - JSON serialization and outcome classification for the
//!   remote HR endpoint
//! - [`probe`] - bounded-latency connectivity check
//! - [`config`] - operator-facing configuration
//! - [`runner`] - the daemon main loop and IPC server
//!
//! The foreground `punch` CLI appends scan events straight into the shared
//! SQLite store; this daemon only ever reads pending rows and applies
//! delivery outcomes.

pub mod config;
pub mod delivery;
pub mod error;
pub mod ipc;
pub mod probe;
pub mod retry;
pub mod runner;
pub mod scheduler;

pub use config::Config;
pub use error::{Error, Result};
