// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Badge-scan event model.
//!
//! An [`Event`] is one badge scan waiting for delivery to the remote
//! payroll endpoint. Events are identified by `(badge_id, timestamp)`;
//! the timestamp keeps full precision so the delivery layer can reformat
//! it for the receiver independently of storage.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Delivery state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    /// Waiting to be picked up by the next flush. Initial state.
    Pending,
    /// Selected by an in-progress flush.
    InFlight,
    /// Exhausted retries or fatally rejected; kept for manual handling.
    DeadLettered,
}

impl EventState {
    /// Returns the string representation used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventState::Pending => "pending",
            EventState::InFlight => "in_flight",
            EventState::DeadLettered => "dead",
        }
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventState {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Error> {
        match s {
            "pending" => Ok(EventState::Pending),
            "in_flight" => Ok(EventState::InFlight),
            "dead" => Ok(EventState::DeadLettered),
            _ => Err(Error::InvalidState(s.to_string())),
        }
    }
}

/// Unique identity of an event: the badge that was scanned and when.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Opaque badge identifier. Not validated for format.
    pub badge_id: String,
    /// Scan time, full precision.
    pub timestamp: DateTime<Utc>,
}

impl EventId {
    /// Create a new event identity.
    pub fn new(badge_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        EventId {
            badge_id: badge_id.into(),
            timestamp,
        }
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.badge_id, self.timestamp.to_rfc3339())
    }
}

/// One badge-scan record pending or historically delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque badge identifier.
    pub badge_id: String,
    /// Scan time, full precision.
    pub timestamp: DateTime<Utc>,
    /// Delivery state.
    pub state: EventState,
    /// Delivery attempts made so far. Only increases; reset only by
    /// successful delivery (row removed) or dead-letter clearing.
    pub attempts: u32,
}

impl Event {
    /// Create a new pending event with zero attempts.
    pub fn new(badge_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Event {
            badge_id: badge_id.into(),
            timestamp,
            state: EventState::Pending,
            attempts: 0,
        }
    }

    /// The identity key of this event.
    pub fn id(&self) -> EventId {
        EventId::new(self.badge_id.clone(), self.timestamp)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
