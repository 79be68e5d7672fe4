// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared IPC protocol for CLI-daemon communication.
//!
//! This crate defines the message types and framing protocol used between
//! the `punch` CLI and the `punchd` daemon. Messages are serialized as JSON
//! with length-prefixed framing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request sent from CLI to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonRequest {
    /// Ping to check if daemon is alive.
    Ping,
    /// Get daemon status.
    Status,
    /// Force a flush now (bypasses the minimum-interval check).
    SyncNow,
    /// Graceful shutdown (performs one final forced flush).
    Shutdown,
}

/// Response sent from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum DaemonResponse {
    /// Response to Ping.
    Pong,
    /// Response to Status.
    Status(DaemonStatus),
    /// Response to SyncNow.
    Sync(SyncOutcome),
    /// Daemon is shutting down.
    ShuttingDown,
    /// Request failed.
    Error { message: String },
}

/// Status snapshot of the running daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonStatus {
    /// Daemon process ID.
    pub pid: u32,
    /// Seconds since daemon start.
    pub uptime_secs: u64,
    /// Events waiting for delivery.
    pub pending: usize,
    /// Events dead-lettered (awaiting manual handling).
    pub dead: usize,
    /// Outcome of the most recent flush attempt, if any ran.
    pub last_sync: Option<SyncOutcome>,
    /// Time of the last confirmed remote delivery.
    pub last_confirmed_delivery: Option<DateTime<Utc>>,
}

/// Outcome of one flush attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome")]
pub enum SyncOutcome {
    /// A flush ran; counts describe what happened to the attempted events.
    Completed(SyncSummary),
    /// No connectivity; nothing was attempted.
    Offline,
    /// Another flush was already in progress.
    Busy,
    /// The minimum inter-sync interval has not elapsed.
    TooSoon,
    /// The flush aborted on a storage error.
    Failed { message: String },
}

/// Per-flush delivery counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSummary {
    /// Events selected for this flush.
    pub attempted: usize,
    /// Events confirmed accepted and removed.
    pub delivered: usize,
    /// Events returned to pending for a later flush.
    pub requeued: usize,
    /// Events dead-lettered.
    pub dead_lettered: usize,
}

/// IPC message framing.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: JSON-encoded message
pub mod framing {
    use std::io::{Read, Write};

    use super::*;

    /// Maximum message size (1MB) to prevent malformed responses from causing hangs.
    const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    fn read_frame<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("message too large: {} bytes", len),
            ));
        }
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> std::io::Result<()> {
        let len = payload.len() as u32;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(payload)?;
        writer.flush()
    }

    /// Read a request from the given reader.
    pub fn read_request<R: Read>(reader: &mut R) -> std::io::Result<DaemonRequest> {
        let buf = read_frame(reader)?;
        serde_json::from_slice(&buf).map_err(std::io::Error::other)
    }

    /// Write a request to the given writer.
    pub fn write_request<W: Write>(writer: &mut W, req: &DaemonRequest) -> std::io::Result<()> {
        let payload = serde_json::to_vec(req).map_err(std::io::Error::other)?;
        write_frame(writer, &payload)
    }

    /// Read a response from the given reader.
    pub fn read_response<R: Read>(reader: &mut R) -> std::io::Result<DaemonResponse> {
        let buf = read_frame(reader)?;
        serde_json::from_slice(&buf).map_err(std::io::Error::other)
    }

    /// Write a response to the given writer.
    pub fn write_response<W: Write>(writer: &mut W, resp: &DaemonResponse) -> std::io::Result<()> {
        let payload = serde_json::to_vec(resp).map_err(std::io::Error::other)?;
        write_frame(writer, &payload)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
