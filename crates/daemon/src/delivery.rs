// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery client for the remote HR endpoint.
//!
//! Serializes events to the receiver's JSON contract and classifies each
//! call's result as accepted, retryable, or fatal:
//!
//! - 2xx response -> [`DeliveryOutcome::Accepted`]
//! - network failure (timeout, refused, DNS) or 5xx -> retryable
//! - 4xx (malformed payload, business-rule rejection) -> fatal
//!
//! The [`DeliveryClient`] trait is the seam the scheduler is tested through;
//! [`HttpDeliveryClient`] is the production implementation.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use pc_core::Event;
use serde::Serialize;

use crate::error::Result;

/// Timestamp format the receiver expects: day month year hour minute.
pub const WIRE_TIME_FORMAT: &str = "%d%m%y%H%M";

/// Classified result of one delivery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint confirmed acceptance.
    Accepted,
    /// Transient failure; worth retrying.
    RejectedRetryable { reason: String },
    /// Permanent rejection; retrying cannot help.
    RejectedFatal { reason: String },
}

impl DeliveryOutcome {
    /// Whether this outcome is a confirmed acceptance.
    pub fn is_accepted(&self) -> bool {
        matches!(self, DeliveryOutcome::Accepted)
    }
}

/// One event on the wire.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecordPayload {
    /// Badge identifier.
    pub cracha: String,
    /// Scan time formatted as [`WIRE_TIME_FORMAT`].
    pub horario: String,
}

impl From<&Event> for RecordPayload {
    fn from(event: &Event) -> Self {
        RecordPayload {
            cracha: event.badge_id.clone(),
            horario: event.timestamp.format(WIRE_TIME_FORMAT).to_string(),
        }
    }
}

/// Build the per-record request body: `{"cracha": ..., "horario": ...}`.
pub fn record_body(event: &Event) -> serde_json::Value {
    serde_json::json!(RecordPayload::from(event))
}

/// Build the batch request body: `{"batidas": "<JSON array string>"}`.
///
/// The receiver expects the record array JSON-encoded into a string, not
/// nested as a plain array.
pub fn batch_body(events: &[Event]) -> Result<serde_json::Value> {
    let records: Vec<RecordPayload> = events.iter().map(RecordPayload::from).collect();
    let encoded = serde_json::to_string(&records)?;
    Ok(serde_json::json!({ "batidas": encoded }))
}

/// Map an HTTP status code to a delivery outcome.
pub fn classify_status(status: u16) -> DeliveryOutcome {
    match status {
        200..=299 => DeliveryOutcome::Accepted,
        400..=499 => DeliveryOutcome::RejectedFatal {
            reason: format!("rejected with status {}", status),
        },
        _ => DeliveryOutcome::RejectedRetryable {
            reason: format!("unexpected status {}", status),
        },
    }
}

/// Performs the network call(s) for one record or one batch.
pub trait DeliveryClient: Send + Sync {
    /// Deliver a single event.
    fn deliver_record<'a>(
        &'a self,
        event: &'a Event,
    ) -> Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>>;

    /// Deliver a batch of events in one call.
    fn deliver_batch<'a>(
        &'a self,
        events: &'a [Event],
    ) -> Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>>;
}

/// HTTP POST delivery to the configured endpoint.
pub struct HttpDeliveryClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDeliveryClient {
    /// Create a client for the given endpoint with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpDeliveryClient {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn post(&self, body: serde_json::Value) -> DeliveryOutcome {
        match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(resp) => classify_status(resp.status().as_u16()),
            Err(e) => DeliveryOutcome::RejectedRetryable {
                reason: e.to_string(),
            },
        }
    }
}

impl DeliveryClient for HttpDeliveryClient {
    fn deliver_record<'a>(
        &'a self,
        event: &'a Event,
    ) -> Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>> {
        Box::pin(async move { self.post(record_body(event)).await })
    }

    fn deliver_batch<'a>(
        &'a self,
        events: &'a [Event],
    ) -> Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'a>> {
        Box::pin(async move {
            match batch_body(events) {
                Ok(body) => self.post(body).await,
                // A batch we cannot serialize will never serialize; fatal.
                Err(e) => DeliveryOutcome::RejectedFatal {
                    reason: format!("cannot encode batch: {}", e),
                },
            }
        })
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
