// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync scheduler, driven through mock prober and delivery
//! client implementations under paused tokio time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::TimeZone;
use pc_core::EventState;

use super::*;

/// Prober whose answer is flipped by the test.
struct FlagProber {
    online: Arc<AtomicBool>,
}

impl FlagProber {
    fn new(online: bool) -> (Self, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(online));
        (
            FlagProber {
                online: Arc::clone(&flag),
            },
            flag,
        )
    }
}

impl Prober for FlagProber {
    fn is_online(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = bool> + Send + '_>> {
        let online = self.online.load(Ordering::SeqCst);
        Box::pin(async move { online })
    }
}

/// Delivery client that replays a scripted sequence of outcomes.
///
/// Once the script is exhausted every call is `Accepted`. Each attempt can
/// run a hook (used to flip flags mid-flush).
struct MockClient {
    script: Mutex<VecDeque<DeliveryOutcome>>,
    record_calls: Mutex<Vec<String>>,
    batch_calls: Mutex<Vec<usize>>,
    attempts: AtomicUsize,
    on_attempt: Option<Box<dyn Fn() + Send + Sync>>,
}

impl MockClient {
    fn accepting() -> Self {
        Self::scripted(Vec::new())
    }

    fn scripted(outcomes: Vec<DeliveryOutcome>) -> Self {
        MockClient {
            script: Mutex::new(outcomes.into()),
            record_calls: Mutex::new(Vec::new()),
            batch_calls: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            on_attempt: None,
        }
    }

    fn next_outcome(&self) -> DeliveryOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_attempt {
            hook();
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DeliveryOutcome::Accepted)
    }

    fn total_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl DeliveryClient for MockClient {
    fn deliver_record<'a>(
        &'a self,
        event: &'a Event,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DeliveryOutcome> + Send + 'a>> {
        self.record_calls.lock().unwrap().push(event.badge_id.clone());
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }

    fn deliver_batch<'a>(
        &'a self,
        events: &'a [Event],
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = DeliveryOutcome> + Send + 'a>> {
        self.batch_calls.lock().unwrap().push(events.len());
        let outcome = self.next_outcome();
        Box::pin(async move { outcome })
    }
}

fn retryable() -> DeliveryOutcome {
    DeliveryOutcome::RejectedRetryable {
        reason: "timeout".to_string(),
    }
}

fn fatal() -> DeliveryOutcome {
    DeliveryOutcome::RejectedFatal {
        reason: "rejected with status 400".to_string(),
    }
}

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn config(mode: DeliveryMode) -> SchedulerConfig {
    SchedulerConfig {
        min_interval: Duration::from_secs(900),
        mode,
        window: BatchWindow::All,
        policy: RetryPolicy::default(),
    }
}

fn scheduler(
    client: MockClient,
    online: bool,
    mode: DeliveryMode,
) -> (SyncScheduler<FlagProber, MockClient>, Arc<AtomicBool>, Arc<AtomicBool>) {
    let store = EventStore::open_in_memory().unwrap();
    let (prober, online_flag) = FlagProber::new(online);
    let shutdown = Arc::new(AtomicBool::new(false));
    let sched = SyncScheduler::new(store, prober, client, config(mode), Arc::clone(&shutdown));
    (sched, online_flag, shutdown)
}

#[tokio::test(start_paused = true)]
async fn test_accepted_record_is_removed() {
    let (mut sched, _, _) = scheduler(MockClient::accepting(), true, DeliveryMode::PerRecord);
    sched.store().append("12345678", ts(1000)).unwrap();

    let outcome = sched.tick().await;

    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush, got {:?}", outcome);
    };
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.delivered, 1);
    assert_eq!(sched.store().count_pending().unwrap(), 0);
    assert!(sched.store().last_confirmed_delivery().unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_min_interval_allows_only_one_flush() {
    let (mut sched, _, _) = scheduler(MockClient::accepting(), true, DeliveryMode::PerRecord);
    sched.store().append("111", ts(1000)).unwrap();

    let first = sched.tick().await;
    assert!(matches!(first, SyncOutcome::Completed(_)));

    // One second later: the 900s minimum has not elapsed
    tokio::time::advance(Duration::from_secs(1)).await;
    sched.store().append("222", ts(2000)).unwrap();
    assert_eq!(sched.tick().await, SyncOutcome::TooSoon);

    // After the interval the second event goes out
    tokio::time::advance(Duration::from_secs(900)).await;
    assert!(matches!(sched.tick().await, SyncOutcome::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_offline_makes_no_attempts_and_no_state_changes() {
    let (mut sched, _, _) = scheduler(MockClient::accepting(), false, DeliveryMode::PerRecord);
    let id = sched.store().append("111", ts(1000)).unwrap();

    assert_eq!(sched.tick().await, SyncOutcome::Offline);

    assert_eq!(sched.client_ref().total_attempts(), 0);
    let event = sched.store().get(&id).unwrap().unwrap();
    assert_eq!(event.state, EventState::Pending);
    assert_eq!(event.attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_flush_in_progress_guard_refuses_reentry() {
    let (mut sched, _, _) = scheduler(MockClient::accepting(), true, DeliveryMode::PerRecord);
    let id = sched.store().append("111", ts(1000)).unwrap();

    // While a flush is marked in progress, both scheduled and forced
    // attempts answer Busy without touching the prober, client, or store.
    sched.flush_in_progress = true;
    assert_eq!(sched.tick().await, SyncOutcome::Busy);
    assert_eq!(sched.flush(FlushTrigger::Forced).await, SyncOutcome::Busy);

    assert_eq!(sched.client_ref().total_attempts(), 0);
    let event = sched.store().get(&id).unwrap().unwrap();
    assert_eq!(event.state, EventState::Pending);
    assert_eq!(event.attempts, 0);

    // Releasing the guard lets the next tick deliver normally
    sched.flush_in_progress = false;
    assert!(matches!(sched.tick().await, SyncOutcome::Completed(_)));
    assert_eq!(sched.store().count_pending().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_forced_flush_bypasses_interval_but_not_offline() {
    let (mut sched, online, _) = scheduler(MockClient::accepting(), true, DeliveryMode::PerRecord);
    sched.store().append("111", ts(1000)).unwrap();

    assert!(matches!(sched.tick().await, SyncOutcome::Completed(_)));

    // Interval not elapsed: scheduled tick refuses, forced does not
    sched.store().append("222", ts(2000)).unwrap();
    assert_eq!(sched.tick().await, SyncOutcome::TooSoon);
    assert!(matches!(
        sched.flush(FlushTrigger::Forced).await,
        SyncOutcome::Completed(_)
    ));

    // Forced flush still respects the online check
    online.store(false, Ordering::SeqCst);
    assert_eq!(
        sched.flush(FlushTrigger::Forced).await,
        SyncOutcome::Offline
    );
}

#[tokio::test(start_paused = true)]
async fn test_fatal_record_does_not_poison_the_rest() {
    // First record is fatally rejected, second is accepted
    let client = MockClient::scripted(vec![fatal()]);
    let (mut sched, _, _) = scheduler(client, true, DeliveryMode::PerRecord);
    let bad = sched.store().append("bad", ts(1000)).unwrap();
    sched.store().append("good", ts(2000)).unwrap();

    let outcome = sched.tick().await;

    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush");
    };
    assert_eq!(summary.dead_lettered, 1);
    assert_eq!(summary.delivered, 1);

    let dead = sched.store().get(&bad).unwrap().unwrap();
    assert_eq!(dead.state, EventState::DeadLettered);
    assert_eq!(sched.store().count_pending().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_dead_letter_the_record() {
    // Retryable on every attempt; max_attempts = 3
    let client = MockClient::scripted(vec![retryable(), retryable(), retryable()]);
    let (mut sched, _, _) = scheduler(client, true, DeliveryMode::PerRecord);
    let id = sched.store().append("111", ts(1000)).unwrap();

    let outcome = sched.tick().await;

    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush");
    };
    assert_eq!(summary.dead_lettered, 1);
    assert_eq!(sched.client_ref().total_attempts(), 3);

    let event = sched.store().get(&id).unwrap().unwrap();
    assert_eq!(event.state, EventState::DeadLettered);
    assert_eq!(event.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_retry_requeues_with_attempts_recorded() {
    // The first attempt fails and the hook requests shutdown, so the retry
    // loop stops before its backoff wait with budget remaining.
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let mut client = MockClient::scripted(vec![retryable()]);
    let hook_flag = Arc::clone(&shutdown_flag);
    client.on_attempt = Some(Box::new(move || {
        hook_flag.store(true, Ordering::SeqCst);
    }));

    let store = EventStore::open_in_memory().unwrap();
    let (prober, _) = FlagProber::new(true);
    let mut sched = SyncScheduler::new(
        store,
        prober,
        client,
        config(DeliveryMode::PerRecord),
        Arc::clone(&shutdown_flag),
    );
    let id = sched.store().append("111", ts(1000)).unwrap();

    let outcome = sched.tick().await;

    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush");
    };
    assert_eq!(summary.requeued, 1);

    let event = sched.store().get(&id).unwrap().unwrap();
    assert_eq!(event.state, EventState::Pending);
    assert_eq!(event.attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_batch_mode_removes_all_in_one_flush() {
    let (mut sched, _, _) = scheduler(MockClient::accepting(), true, DeliveryMode::Batch);
    sched.store().append("111", ts(1000)).unwrap();
    sched.store().append("222", ts(2000)).unwrap();

    let outcome = sched.tick().await;

    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush");
    };
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.delivered, 2);
    // One HTTP call carried both records
    assert_eq!(sched.client_ref().batch_calls.lock().unwrap().as_slice(), &[2]);
    assert_eq!(sched.store().count_pending().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_retryable_requeues_members_below_ceiling() {
    let client = MockClient::scripted(vec![retryable()]);
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let mut client = client;
    let hook_flag = Arc::clone(&shutdown_flag);
    client.on_attempt = Some(Box::new(move || {
        hook_flag.store(true, Ordering::SeqCst);
    }));

    let store = EventStore::open_in_memory().unwrap();
    let (prober, _) = FlagProber::new(true);
    let mut sched = SyncScheduler::new(
        store,
        prober,
        client,
        config(DeliveryMode::Batch),
        shutdown_flag,
    );
    let a = sched.store().append("111", ts(1000)).unwrap();
    sched.store().append("222", ts(2000)).unwrap();

    let outcome = sched.tick().await;

    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush");
    };
    assert_eq!(summary.requeued, 2);

    let event = sched.store().get(&a).unwrap().unwrap();
    assert_eq!(event.state, EventState::Pending);
    assert_eq!(event.attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_offline_until_interval_scenario() {
    // Scan at T0, offline until T0+905, tick every 60s.
    let (mut sched, online, _) = scheduler(MockClient::accepting(), false, DeliveryMode::PerRecord);
    let id = sched.store().append("12345678", ts(0)).unwrap();

    // 15 ticks while offline: zero delivery attempts
    for _ in 0..15 {
        assert_eq!(sched.tick().await, SyncOutcome::Offline);
        tokio::time::advance(Duration::from_secs(60)).await;
    }
    assert_eq!(sched.client_ref().total_attempts(), 0);

    // Connectivity returns at T0+905; the next tick flushes
    online.store(true, Ordering::SeqCst);
    let outcome = sched.tick().await;
    let SyncOutcome::Completed(summary) = outcome else {
        panic!("expected completed flush");
    };
    assert_eq!(summary.delivered, 1);
    assert_eq!(sched.client_ref().total_attempts(), 1);
    assert!(sched.store().get(&id).unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_empty_pending_set_completes_without_calls() {
    let (mut sched, _, _) = scheduler(MockClient::accepting(), true, DeliveryMode::PerRecord);

    let outcome = sched.tick().await;
    assert_eq!(outcome, SyncOutcome::Completed(SyncSummary::default()));
    assert_eq!(sched.client_ref().total_attempts(), 0);
}

#[test]
fn test_select_window_all_keeps_everything() {
    let events = vec![Event::new("1", ts(0)), Event::new("2", ts(10_000))];
    let kept = select_window(BatchWindow::All, ts(20_000), events);
    assert_eq!(kept.len(), 2);
}

#[test]
fn test_select_window_last_hour() {
    // now = 14:05; window is [13:00, 14:00)
    let now = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 0).unwrap();
    let events = vec![
        Event::new("early", Utc.with_ymd_and_hms(2026, 3, 9, 12, 59, 59).unwrap()),
        Event::new("in-window", Utc.with_ymd_and_hms(2026, 3, 9, 13, 0, 0).unwrap()),
        Event::new("late-window", Utc.with_ymd_and_hms(2026, 3, 9, 13, 59, 59).unwrap()),
        Event::new("current-hour", Utc.with_ymd_and_hms(2026, 3, 9, 14, 1, 0).unwrap()),
    ];

    let kept = select_window(BatchWindow::LastHour, now, events);
    let badges: Vec<&str> = kept.iter().map(|e| e.badge_id.as_str()).collect();
    assert_eq!(badges, vec!["in-window", "late-window"]);
}
