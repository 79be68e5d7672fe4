// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity prober.
//!
//! A cheap reachability check against a well-known external URL. Absence of
//! connectivity is a normal, expected outcome for a kiosk on a flaky link,
//! so the probe never errors; it answers yes or no within a bounded timeout.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::Result;

/// Reachability probe for the network path to the outside world.
pub trait Prober: Send + Sync {
    /// Whether the network path is currently usable.
    fn is_online(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// HTTP probe with a short timeout.
///
/// Any response counts as online, including error statuses: the probe target
/// answering at all proves the path is up. The response body is irrelevant.
pub struct HttpProber {
    client: reqwest::Client,
    url: String,
}

impl HttpProber {
    /// Create a prober against the given URL with the given timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpProber {
            client,
            url: url.into(),
        })
    }
}

impl Prober for HttpProber {
    fn is_online(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            match self.client.get(&self.url).send().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!("connectivity probe failed: {}", e);
                    false
                }
            }
        })
    }
}
