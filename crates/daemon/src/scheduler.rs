// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync scheduler: the control loop deciding when and how to flush.
//!
//! Per wake-up:
//! 1. No-op if a flush is already in progress.
//! 2. No-op if the minimum inter-sync interval has not elapsed
//!    (forced flushes skip this check only).
//! 3. No-op if offline.
//! 4. Otherwise pull the pending set, deliver it through the retry
//!    controller, and apply the per-event outcomes to the store.
//!
//! The scheduler owns `last_flush_time` and the `flush_in_progress` guard as
//! structured state; there are no re-arming callbacks. A storage error aborts
//! the current flush cleanly and the next timer tick retries the same
//! pending set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, DurationRound, Utc};
use pc_core::{Event, EventId, EventStore};
use pc_ipc::{SyncOutcome, SyncSummary};

use crate::config::{BatchWindow, DeliveryMode};
use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::error::Result;
use crate::probe::Prober;
use crate::retry::{retry_deliver, RetryPolicy};

/// What caused a flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Periodic timer tick; subject to the minimum-interval rule.
    Scheduled,
    /// Shutdown or explicit "sync now"; bypasses the interval check only.
    Forced,
}

/// Scheduler tuning, derived from the daemon [`Config`](crate::config::Config).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Minimum time between flush runs.
    pub min_interval: Duration,
    /// Delivery mode.
    pub mode: DeliveryMode,
    /// Batch selection window (batch mode only).
    pub window: BatchWindow,
    /// Retry policy applied per record or batch.
    pub policy: RetryPolicy,
}

/// The sync control loop state and logic.
pub struct SyncScheduler<P: Prober, D: DeliveryClient> {
    store: EventStore,
    prober: P,
    client: D,
    config: SchedulerConfig,
    last_flush_time: Option<tokio::time::Instant>,
    flush_in_progress: bool,
    shutdown: Arc<AtomicBool>,
}

impl<P: Prober, D: DeliveryClient> SyncScheduler<P, D> {
    /// Create a scheduler over the given store and collaborators.
    pub fn new(
        store: EventStore,
        prober: P,
        client: D,
        config: SchedulerConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        SyncScheduler {
            store,
            prober,
            client,
            config,
            last_flush_time: None,
            flush_in_progress: false,
            shutdown,
        }
    }

    /// The underlying event store (for status queries).
    pub fn store(&self) -> &EventStore {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn client_ref(&self) -> &D {
        &self.client
    }

    /// Periodic wake-up: a scheduled flush attempt.
    pub async fn tick(&mut self) -> SyncOutcome {
        self.flush(FlushTrigger::Scheduled).await
    }

    /// One flush attempt.
    pub async fn flush(&mut self, trigger: FlushTrigger) -> SyncOutcome {
        if self.flush_in_progress {
            return SyncOutcome::Busy;
        }

        if trigger == FlushTrigger::Scheduled {
            if let Some(last) = self.last_flush_time {
                if last.elapsed() < self.config.min_interval {
                    return SyncOutcome::TooSoon;
                }
            }
        }

        if !self.prober.is_online().await {
            tracing::info!("waiting for connectivity");
            return SyncOutcome::Offline;
        }

        self.flush_in_progress = true;
        let result = self.run_flush().await;
        self.flush_in_progress = false;

        match result {
            Ok(summary) => {
                self.last_flush_time = Some(tokio::time::Instant::now());
                tracing::info!(
                    "flush complete: {} attempted, {} delivered, {} requeued, {} dead-lettered",
                    summary.attempted,
                    summary.delivered,
                    summary.requeued,
                    summary.dead_lettered
                );
                SyncOutcome::Completed(summary)
            }
            Err(e) => {
                tracing::error!("flush aborted on storage error: {}", e);
                // Rows already marked in-flight would otherwise wait for a
                // restart; put them back so the next tick retries them.
                if let Err(e) = self.store.requeue_in_flight() {
                    tracing::error!("failed to requeue in-flight rows: {}", e);
                }
                SyncOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn run_flush(&mut self) -> Result<SyncSummary> {
        let pending = self.store.list_pending()?;
        if pending.is_empty() {
            return Ok(SyncSummary::default());
        }

        match self.config.mode {
            DeliveryMode::PerRecord => self.flush_per_record(pending).await,
            DeliveryMode::Batch => self.flush_batch(pending).await,
        }
    }

    /// Deliver each pending event with its own call, in insertion order.
    ///
    /// A fatal rejection dead-letters that record and moves on; it never
    /// poisons the rest of the run.
    async fn flush_per_record(&mut self, pending: Vec<Event>) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        for event in pending {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("shutdown requested, leaving remaining events pending");
                break;
            }

            let id = event.id();
            self.store.mark_in_flight(std::slice::from_ref(&id))?;
            summary.attempted += 1;

            let budget = self
                .config
                .policy
                .max_attempts
                .saturating_sub(event.attempts);
            let report = retry_deliver(&self.config.policy, budget, &self.shutdown, || {
                self.client.deliver_record(&event)
            })
            .await;

            self.apply_outcome(
                std::slice::from_ref(&id),
                &report.outcome,
                report.attempts,
                event.attempts,
                &mut summary,
            )?;
        }

        Ok(summary)
    }

    /// Deliver the selected window of pending events as one payload.
    async fn flush_batch(&mut self, pending: Vec<Event>) -> Result<SyncSummary> {
        let now = Utc::now();
        let batch = select_window(self.config.window, now, pending);
        if batch.is_empty() {
            tracing::debug!("no events in the batch window");
            return Ok(SyncSummary::default());
        }

        let ids: Vec<EventId> = batch.iter().map(Event::id).collect();
        self.store.mark_in_flight(&ids)?;

        let mut summary = SyncSummary {
            attempted: batch.len(),
            ..SyncSummary::default()
        };

        // The whole batch shares one retry budget, bounded by the least
        // attempted event so no member can exceed the policy maximum.
        let min_attempts = batch.iter().map(|e| e.attempts).min().unwrap_or(0);
        let budget = self.config.policy.max_attempts.saturating_sub(min_attempts);
        let report = retry_deliver(&self.config.policy, budget, &self.shutdown, || {
            self.client.deliver_batch(&batch)
        })
        .await;

        match &report.outcome {
            DeliveryOutcome::Accepted => {
                self.store.remove(&ids)?;
                self.store.set_last_confirmed_delivery(Utc::now())?;
                summary.delivered = ids.len();
                tracing::info!("batch of {} accepted", ids.len());
            }
            DeliveryOutcome::RejectedFatal { reason } => {
                self.store.mark_dead(&ids, report.attempts)?;
                summary.dead_lettered = ids.len();
                tracing::warn!(
                    "batch of {} fatally rejected after {} attempts: {}",
                    ids.len(),
                    report.attempts,
                    reason
                );
            }
            DeliveryOutcome::RejectedRetryable { reason } => {
                // Split per event: those at the attempt ceiling die, the
                // rest go back to pending for the next flush.
                let mut exhausted = Vec::new();
                let mut remaining = Vec::new();
                for event in &batch {
                    if event.attempts + report.attempts >= self.config.policy.max_attempts {
                        exhausted.push(event.id());
                    } else {
                        remaining.push(event.id());
                    }
                }
                if !exhausted.is_empty() {
                    self.store.mark_dead(&exhausted, report.attempts)?;
                    summary.dead_lettered = exhausted.len();
                }
                if !remaining.is_empty() {
                    self.store.mark_pending(&remaining, report.attempts)?;
                    summary.requeued = remaining.len();
                }
                tracing::warn!(
                    "batch of {} not delivered after {} attempts: {}",
                    ids.len(),
                    report.attempts,
                    reason
                );
            }
        }

        Ok(summary)
    }

    /// Apply a single record's final outcome to the store.
    fn apply_outcome(
        &self,
        ids: &[EventId],
        outcome: &DeliveryOutcome,
        attempts_made: u32,
        prior_attempts: u32,
        summary: &mut SyncSummary,
    ) -> Result<()> {
        match outcome {
            DeliveryOutcome::Accepted => {
                self.store.remove(ids)?;
                self.store.set_last_confirmed_delivery(Utc::now())?;
                summary.delivered += ids.len();
                for id in ids {
                    tracing::info!("delivered {}", id);
                }
            }
            DeliveryOutcome::RejectedFatal { reason } => {
                self.store.mark_dead(ids, attempts_made)?;
                summary.dead_lettered += ids.len();
                for id in ids {
                    tracing::warn!(
                        "dead-lettered {} after {} attempts: {}",
                        id,
                        prior_attempts + attempts_made,
                        reason
                    );
                }
            }
            DeliveryOutcome::RejectedRetryable { reason } => {
                let total = prior_attempts + attempts_made;
                if total >= self.config.policy.max_attempts {
                    self.store.mark_dead(ids, attempts_made)?;
                    summary.dead_lettered += ids.len();
                    for id in ids {
                        tracing::warn!(
                            "dead-lettered {} after exhausting {} attempts: {}",
                            id,
                            total,
                            reason
                        );
                    }
                } else {
                    self.store.mark_pending(ids, attempts_made)?;
                    summary.requeued += ids.len();
                    for id in ids {
                        tracing::info!(
                            "requeued {} ({} of {} attempts used): {}",
                            id,
                            total,
                            self.config.policy.max_attempts,
                            reason
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Select the events a batch flush should carry.
///
/// `LastHour` keeps events whose scan time falls inside the last completed
/// clock hour (e.g. at 14:05, events from 13:00:00 to 13:59:59).
pub fn select_window(window: BatchWindow, now: DateTime<Utc>, events: Vec<Event>) -> Vec<Event> {
    match window {
        BatchWindow::All => events,
        BatchWindow::LastHour => {
            let Ok(hour_start) = now.duration_trunc(chrono::Duration::hours(1)) else {
                return events;
            };
            let window_start = hour_start - chrono::Duration::hours(1);
            events
                .into_iter()
                .filter(|e| e.timestamp >= window_start && e.timestamp < hour_start)
                .collect()
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
