// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Async framing for the daemon side of the IPC socket.
//!
//! The wire format is defined in [`pc_ipc`]: a 4-byte big-endian length
//! prefix followed by a JSON-encoded message. This module provides the
//! tokio counterparts of the blocking helpers in [`pc_ipc::framing`].

use pc_ipc::{DaemonRequest, DaemonResponse};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum message size (1MB) to prevent malformed requests from causing hangs.
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("message too large: {} bytes", len),
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> std::io::Result<()> {
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await
}

/// Read a request from the given async reader.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<DaemonRequest> {
    let buf = read_frame(reader).await?;
    serde_json::from_slice(&buf).map_err(std::io::Error::other)
}

/// Write a response to the given async writer.
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    resp: &DaemonResponse,
) -> std::io::Result<()> {
    let payload = serde_json::to_vec(resp).map_err(std::io::Error::other)?;
    write_frame(writer, &payload).await
}

#[cfg(test)]
#[path = "ipc_tests.rs"]
mod tests;
