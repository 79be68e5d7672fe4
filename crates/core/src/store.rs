// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable store for badge-scan events.
//!
//! The [`EventStore`] is the sole source of truth for "what has not yet been
//! confirmed delivered". Appends are durable before the next scheduled flush;
//! rows are removed only after the remote endpoint confirms acceptance.
//!
//! Concurrency: WAL mode plus a busy timeout lets the foreground append path
//! and the background flush path share the database without blocking each
//! other beyond the write-lock acquisition for a single statement. All
//! multi-row mutations run in a transaction: either all named ids transition,
//! or none do.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::error::{Error, Result};
use crate::event::{Event, EventId, EventState};

/// SQL schema for the event store.
pub const SCHEMA: &str = r#"
-- Pending/in-flight/dead scan events, keyed by identity
CREATE TABLE IF NOT EXISTS punches (
    badge_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    state TEXT NOT NULL DEFAULT 'pending',
    attempts INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (badge_id, timestamp)
);

-- All-time audit log, never pruned
CREATE TABLE IF NOT EXISTS punch_audit (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    badge_id TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

-- Engine metadata (last confirmed delivery time)
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_punches_state ON punches(state);
CREATE INDEX IF NOT EXISTS idx_audit_badge ON punch_audit(badge_id);
"#;

/// Meta key for the last confirmed delivery timestamp.
const META_LAST_CONFIRMED: &str = "last_confirmed_delivery";

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse an event state from the database.
fn parse_state(value: &str) -> std::result::Result<EventState, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid event state '{value}'"
            ))),
        )
    })
}

/// Run schema creation and all migrations on a database connection.
///
/// Applies the canonical schema and runs idempotent migrations to upgrade
/// older terminal databases that may be missing columns.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_state_columns(conn)?;
    Ok(())
}

/// Migration: add state/attempts columns to databases created by older
/// terminal builds that stored bare (badge_id, timestamp) rows.
fn migrate_add_state_columns(conn: &Connection) -> Result<()> {
    let columns = [
        ("state", "TEXT NOT NULL DEFAULT 'pending'"),
        ("attempts", "INTEGER NOT NULL DEFAULT 0"),
    ];

    for (column, decl) in columns {
        let has_column: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('punches') WHERE name = ?1",
                [column],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_column {
            let sql = format!("ALTER TABLE punches ADD COLUMN {column} {decl}");
            conn.execute(&sql, [])?;
        }
    }

    Ok(())
}

/// SQLite database connection holding the durable event queue.
pub struct EventStore {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl EventStore {
    /// Open the store at the given path, creating and migrating if needed.
    ///
    /// Does not touch row states: crash recovery via
    /// [`requeue_in_flight`](Self::requeue_in_flight) is the flush owner's
    /// call to make, not every reader's.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = FULL;",
        )?;

        let store = EventStore { conn };
        run_migrations(&store.conn)?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = EventStore { conn };
        run_migrations(&store.conn)?;
        Ok(store)
    }

    /// Durably persist a new pending event.
    ///
    /// Never touches the network, and can only fail on storage errors.
    /// The badge id is opaque at this layer; input validation is the
    /// caller's concern. Insertion is idempotent under the
    /// `(badge_id, timestamp)` identity key so a crash-restart replay of the
    /// same scan does not produce a duplicate row. The audit row is written
    /// in the same transaction.
    pub fn append(&self, badge_id: &str, timestamp: DateTime<Utc>) -> Result<EventId> {
        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO punches (badge_id, timestamp, state, attempts)
             VALUES (?1, ?2, 'pending', 0)",
            params![badge_id, timestamp.to_rfc3339()],
        )?;
        if inserted > 0 {
            tx.execute(
                "INSERT INTO punch_audit (badge_id, timestamp, recorded_at)
                 VALUES (?1, ?2, ?3)",
                params![badge_id, timestamp.to_rfc3339(), Utc::now().to_rfc3339()],
            )?;
        }
        tx.commit()?;

        Ok(EventId::new(badge_id, timestamp))
    }

    /// All pending events in insertion order.
    pub fn list_pending(&self) -> Result<Vec<Event>> {
        self.list_by_state(EventState::Pending)
    }

    /// All dead-lettered events in insertion order.
    pub fn list_dead(&self) -> Result<Vec<Event>> {
        self.list_by_state(EventState::DeadLettered)
    }

    fn list_by_state(&self, state: EventState) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT badge_id, timestamp, state, attempts FROM punches
             WHERE state = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([state.as_str()], |row| {
            let ts: String = row.get(1)?;
            let st: String = row.get(2)?;
            Ok(Event {
                badge_id: row.get(0)?,
                timestamp: parse_timestamp(&ts, "timestamp")?,
                state: parse_state(&st)?,
                attempts: row.get(3)?,
            })
        })?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Look up a single event by identity.
    pub fn get(&self, id: &EventId) -> Result<Option<Event>> {
        use rusqlite::OptionalExtension;

        let event = self
            .conn
            .query_row(
                "SELECT badge_id, timestamp, state, attempts FROM punches
                 WHERE badge_id = ?1 AND timestamp = ?2",
                params![id.badge_id, id.timestamp.to_rfc3339()],
                |row| {
                    let ts: String = row.get(1)?;
                    let st: String = row.get(2)?;
                    Ok(Event {
                        badge_id: row.get(0)?,
                        timestamp: parse_timestamp(&ts, "timestamp")?,
                        state: parse_state(&st)?,
                        attempts: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(event)
    }

    /// Transition the named events to `in_flight`. All or nothing.
    pub fn mark_in_flight(&self, ids: &[EventId]) -> Result<()> {
        self.set_state(ids, EventState::InFlight, 0)
    }

    /// Transition the named events back to `pending`, adding the delivery
    /// attempts made for them during the current flush. All or nothing.
    pub fn mark_pending(&self, ids: &[EventId], attempts_made: u32) -> Result<()> {
        self.set_state(ids, EventState::Pending, attempts_made)
    }

    /// Dead-letter the named events, adding the delivery attempts made.
    /// Dead rows are retained for manual inspection, never retried.
    pub fn mark_dead(&self, ids: &[EventId], attempts_made: u32) -> Result<()> {
        self.set_state(ids, EventState::DeadLettered, attempts_made)
    }

    fn set_state(&self, ids: &[EventId], state: EventState, attempts_made: u32) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for id in ids {
            let updated = tx.execute(
                "UPDATE punches SET state = ?1, attempts = attempts + ?2
                 WHERE badge_id = ?3 AND timestamp = ?4",
                params![
                    state.as_str(),
                    attempts_made,
                    id.badge_id,
                    id.timestamp.to_rfc3339()
                ],
            )?;
            if updated == 0 {
                return Err(Error::EventNotFound {
                    badge_id: id.badge_id.clone(),
                    timestamp: id.timestamp.to_rfc3339(),
                });
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove the named events after confirmed remote acceptance.
    ///
    /// Idempotent: an id that is already gone is ignored, so re-running a
    /// confirmed removal after a crash cannot fail. All removals commit in
    /// one transaction.
    pub fn remove(&self, ids: &[EventId]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for id in ids {
            tx.execute(
                "DELETE FROM punches WHERE badge_id = ?1 AND timestamp = ?2",
                params![id.badge_id, id.timestamp.to_rfc3339()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Clear all dead-lettered events (manual remediation path).
    ///
    /// Returns the number of rows cleared.
    pub fn clear_dead(&self) -> Result<usize> {
        let cleared = self
            .conn
            .execute("DELETE FROM punches WHERE state = 'dead'", [])?;
        Ok(cleared)
    }

    /// Number of pending events.
    pub fn count_pending(&self) -> Result<usize> {
        self.count_by_state(EventState::Pending)
    }

    /// Number of dead-lettered events.
    pub fn count_dead(&self) -> Result<usize> {
        self.count_by_state(EventState::DeadLettered)
    }

    fn count_by_state(&self, state: EventState) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM punches WHERE state = ?1",
            [state.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Timestamp of the last confirmed remote delivery, if any.
    pub fn last_confirmed_delivery(&self) -> Result<Option<DateTime<Utc>>> {
        use rusqlite::OptionalExtension;

        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                [META_LAST_CONFIRMED],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            None => Ok(None),
            Some(s) => Ok(Some(parse_timestamp(&s, "value")?)),
        }
    }

    /// Record the time of a confirmed remote delivery.
    pub fn set_last_confirmed_delivery(&self, ts: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![META_LAST_CONFIRMED, ts.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Flip stale `in_flight` rows back to `pending`.
    ///
    /// A row left in flight means a flush died before recording its
    /// outcome. Only the flush owner should call this: it would undo a
    /// live flush if run concurrently with one.
    pub fn requeue_in_flight(&self) -> Result<usize> {
        let requeued = self.conn.execute(
            "UPDATE punches SET state = 'pending' WHERE state = 'in_flight'",
            [],
        )?;
        Ok(requeued)
    }

    /// All-time audit history as (badge_id, timestamp, recorded_at) rows,
    /// oldest first.
    pub fn audit_history(&self) -> Result<Vec<AuditRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT badge_id, timestamp, recorded_at FROM punch_audit ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let ts: String = row.get(1)?;
            let rec: String = row.get(2)?;
            Ok(AuditRow {
                badge_id: row.get(0)?,
                timestamp: parse_timestamp(&ts, "timestamp")?,
                recorded_at: parse_timestamp(&rec, "recorded_at")?,
            })
        })?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row?);
        }
        Ok(history)
    }
}

/// One row of the all-time audit log.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuditRow {
    /// Badge that was scanned.
    pub badge_id: String,
    /// Scan time.
    pub timestamp: DateTime<Utc>,
    /// When the scan was recorded locally.
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
