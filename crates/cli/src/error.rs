// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the punch CLI.

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Error from the event store.
    #[error(transparent)]
    Store(#[from] pc_core::Error),

    /// Daemon communication or lifecycle failure.
    #[error("daemon: {0}")]
    Daemon(String),

    /// Invalid command-line input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
