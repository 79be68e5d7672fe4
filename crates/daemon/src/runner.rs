// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon runner: main loop and IPC handling.
//!
//! The daemon:
//! 1. Opens the event store and requeues any rows a crash left in flight
//! 2. Creates a Unix socket for IPC
//! 3. Drives periodic flush attempts from a single timer
//! 4. On shutdown, performs one final forced flush bounded by the grace period

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pc_core::EventStore;
use pc_ipc::{DaemonRequest, DaemonResponse, DaemonStatus, SyncOutcome};
use tokio::net::{UnixListener, UnixStream};

use crate::config::Config;
use crate::delivery::HttpDeliveryClient;
use crate::error::{Error, Result};
use crate::ipc;
use crate::probe::HttpProber;
use crate::retry::RetryPolicy;
use crate::scheduler::{FlushTrigger, SchedulerConfig, SyncScheduler};

/// Socket filename within the state directory.
pub const SOCKET_NAME: &str = "daemon.sock";

/// Per-connection IPC timeout.
const IPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Run the daemon for the given state directory.
///
/// This function blocks until shutdown is requested.
pub fn run_daemon(state_dir: &Path, config: &Config) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    rt.block_on(run_daemon_async(state_dir, config))
}

/// Async implementation of the daemon main loop.
pub async fn run_daemon_async(state_dir: &Path, config: &Config) -> Result<()> {
    let store = EventStore::open(&config.db_path(state_dir))?;
    let requeued = store.requeue_in_flight()?;
    if requeued > 0 {
        tracing::warn!("requeued {} rows left in flight by a previous run", requeued);
    }
    tracing::info!(
        "store open: {} pending, {} dead",
        store.count_pending()?,
        store.count_dead()?
    );

    let prober = HttpProber::new(
        config.probe_url.clone(),
        Duration::from_secs(config.probe_timeout_secs),
    )?;
    let client = HttpDeliveryClient::new(
        config.endpoint_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let scheduler_config = SchedulerConfig {
        min_interval: config.min_sync_interval(),
        mode: config.delivery_mode,
        window: config.batch_window,
        policy: RetryPolicy {
            max_attempts: config.max_retry_attempts,
            backoff_base_secs: config.backoff_base_secs,
        },
    };
    let mut scheduler = SyncScheduler::new(
        store,
        prober,
        client,
        scheduler_config,
        Arc::clone(&shutdown),
    );

    let socket_path = state_dir.join(SOCKET_NAME);
    let _ = std::fs::remove_file(&socket_path);
    let listener = UnixListener::bind(&socket_path)?;
    tracing::info!("listening on {}", socket_path.display());

    // Signal ready - do this early so the spawner stops waiting
    println!("READY");
    use std::io::Write;
    let _ = std::io::stdout().flush();

    let start_time = Instant::now();
    let mut last_sync: Option<SyncOutcome> = None;

    // First scheduled attempt one tick after start, like the terminal always
    // ran it; a forced "sync now" over IPC is available immediately.
    let tick = config.tick_interval();
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let outcome = scheduler.tick().await;
                match &outcome {
                    SyncOutcome::TooSoon | SyncOutcome::Busy => {}
                    _ => last_sync = Some(outcome),
                }
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let stop = handle_connection(
                            stream,
                            &mut scheduler,
                            &mut last_sync,
                            start_time,
                        )
                        .await;
                        if stop {
                            tracing::info!("shutdown requested over IPC");
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("accept failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received");
                break;
            }
        }
    }

    // Final best-effort forced flush, bounded by the grace period. The
    // shutdown flag stops retry loops from starting new backoff waits.
    shutdown.store(true, Ordering::Relaxed);
    match tokio::time::timeout(config.shutdown_grace(), scheduler.flush(FlushTrigger::Forced)).await
    {
        Ok(outcome) => tracing::info!("final flush: {:?}", outcome),
        Err(_) => tracing::warn!("final flush did not finish within the grace period"),
    }

    let _ = std::fs::remove_file(&socket_path);
    Ok(())
}

/// Handle one IPC connection. Returns true if shutdown was requested.
async fn handle_connection<P, D>(
    mut stream: UnixStream,
    scheduler: &mut SyncScheduler<P, D>,
    last_sync: &mut Option<SyncOutcome>,
    start_time: Instant,
) -> bool
where
    P: crate::probe::Prober,
    D: crate::delivery::DeliveryClient,
{
    let request = match tokio::time::timeout(IPC_TIMEOUT, ipc::read_request(&mut stream)).await {
        Ok(Ok(req)) => req,
        Ok(Err(e)) => {
            tracing::warn!("failed to read request: {}", e);
            return false;
        }
        Err(_) => {
            tracing::warn!("request read timed out");
            return false;
        }
    };

    let (response, stop) = match request {
        DaemonRequest::Ping => (DaemonResponse::Pong, false),
        DaemonRequest::Status => (status_response(scheduler, last_sync, start_time), false),
        DaemonRequest::SyncNow => {
            let outcome = scheduler.flush(FlushTrigger::Forced).await;
            match &outcome {
                SyncOutcome::Busy => {}
                _ => *last_sync = Some(outcome.clone()),
            }
            (DaemonResponse::Sync(outcome), false)
        }
        DaemonRequest::Shutdown => (DaemonResponse::ShuttingDown, true),
    };

    if let Err(e) = tokio::time::timeout(IPC_TIMEOUT, ipc::write_response(&mut stream, &response))
        .await
        .unwrap_or_else(|_| Err(std::io::Error::other("write timed out")))
    {
        tracing::warn!("failed to write response: {}", e);
    }

    stop
}

fn status_response<P, D>(
    scheduler: &SyncScheduler<P, D>,
    last_sync: &Option<SyncOutcome>,
    start_time: Instant,
) -> DaemonResponse
where
    P: crate::probe::Prober,
    D: crate::delivery::DeliveryClient,
{
    let store = scheduler.store();
    let status = (|| -> Result<DaemonStatus> {
        Ok(DaemonStatus {
            pid: std::process::id(),
            uptime_secs: start_time.elapsed().as_secs(),
            pending: store.count_pending()?,
            dead: store.count_dead()?,
            last_sync: last_sync.clone(),
            last_confirmed_delivery: store.last_confirmed_delivery()?,
        })
    })();

    match status {
        Ok(status) => DaemonResponse::Status(status),
        Err(e) => DaemonResponse::Error {
            message: e.to_string(),
        },
    }
}
