// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential-backoff retry around one delivery call.
//!
//! The controller retries a single record or batch within one flush. The
//! backoff sleep only delays the record being retried; it never blocks the
//! append path, which writes to the store from the foreground process.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::delivery::DeliveryOutcome;

/// Retry policy: attempt bound and backoff base.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum delivery attempts per event.
    pub max_attempts: u32,
    /// Backoff base in seconds; the wait after failed attempt `k` is
    /// `base^(k-1)` seconds (1s, 2s, 4s... for base 2).
    pub backoff_base_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff_base_secs: 2,
        }
    }
}

impl RetryPolicy {
    /// Backoff duration after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.backoff_base_secs.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Final outcome of a retry loop plus the number of attempts made.
#[derive(Debug)]
pub struct RetryReport {
    /// Outcome of the last attempt.
    pub outcome: DeliveryOutcome,
    /// Attempts actually made (1..=budget).
    pub attempts: u32,
}

/// Run one delivery call with bounded retries.
///
/// `budget` caps the attempts for this invocation; callers pass the event's
/// remaining allowance so attempts accumulated in earlier flushes still count
/// toward the policy maximum. Terminates early on acceptance or fatal
/// rejection. When shutdown is requested the current attempt finishes but no
/// new backoff wait starts.
pub async fn retry_deliver<F, Fut>(
    policy: &RetryPolicy,
    budget: u32,
    shutdown: &AtomicBool,
    mut attempt_fn: F,
) -> RetryReport
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DeliveryOutcome>,
{
    let budget = budget.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = attempt_fn().await;

        match &outcome {
            DeliveryOutcome::Accepted | DeliveryOutcome::RejectedFatal { .. } => {
                return RetryReport {
                    outcome,
                    attempts: attempt,
                };
            }
            DeliveryOutcome::RejectedRetryable { reason } => {
                if attempt >= budget {
                    return RetryReport {
                        outcome,
                        attempts: attempt,
                    };
                }
                if shutdown.load(Ordering::Relaxed) {
                    tracing::info!("shutdown requested, not starting backoff wait");
                    return RetryReport {
                        outcome,
                        attempts: attempt,
                    };
                }
                tracing::warn!("delivery attempt {} failed: {}", attempt, reason);
                tokio::time::sleep(policy.delay_after(attempt)).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
