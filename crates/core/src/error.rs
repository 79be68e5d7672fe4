// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for pc-core operations.

use thiserror::Error;

/// All possible errors that can occur in pc-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid event state: '{0}'\n  hint: valid states are: pending, in_flight, dead")]
    InvalidState(String),

    #[error("event not found: {badge_id} @ {timestamp}")]
    EventNotFound { badge_id: String, timestamp: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for pc-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
