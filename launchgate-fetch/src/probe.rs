//! Connectivity probes.
//!
//! Lightweight HTTP checks used as a preflight for one-off decision
//! requests and as a [`Connectivity`] implementation for hosts without a
//! native network-path monitor.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use launchgate_core::Connectivity;

use crate::client::HttpClient;

/// Result of a probe check.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Whether the probe succeeded.
    pub success: bool,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
    /// Optional status code.
    pub status_code: Option<u16>,
    /// Optional error message.
    pub error: Option<String>,
}

/// A probe for checking endpoint availability.
#[derive(Debug, Clone)]
pub struct Probe {
    /// The URL to probe.
    pub url: String,
}

impl Probe {
    /// Creates a new probe for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Executes the probe and returns the result.
    pub async fn check(&self, client: &HttpClient) -> ProbeResult {
        let start = Instant::now();

        debug!(url = %self.url, "Running probe");

        match client.get(&self.url).await {
            Ok(response) => {
                let elapsed = start.elapsed();
                ProbeResult {
                    success: response.status().is_success(),
                    response_time_ms: elapsed.as_millis() as u64,
                    status_code: Some(response.status().as_u16()),
                    error: None,
                }
            }
            Err(e) => {
                let elapsed = start.elapsed();
                ProbeResult {
                    success: false,
                    response_time_ms: elapsed.as_millis() as u64,
                    status_code: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Runs multiple probes concurrently.
pub async fn run_probes(probes: &[Probe], client: &HttpClient) -> Vec<ProbeResult> {
    let futures: Vec<_> = probes.iter().map(|p| p.check(client)).collect();
    join_all(futures).await
}

// ============================================================================
// Probe-backed Connectivity
// ============================================================================

/// Probe-backed reachability: connected when any check URL answers.
///
/// The verdict is pessimistic (`false`) until the first
/// [`refresh`](Self::refresh); callers either refresh explicitly or enter
/// through [`wait_for_connection`](Connectivity::wait_for_connection).
#[derive(Debug)]
pub struct ProbeConnectivity {
    client: HttpClient,
    probes: Vec<Probe>,
    poll_interval: Duration,
    connected: AtomicBool,
}

impl ProbeConnectivity {
    /// Creates a checker over the given check URLs.
    pub fn new<I, S>(client: HttpClient, check_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            probes: check_urls.into_iter().map(Probe::new).collect(),
            poll_interval: Duration::from_secs(1),
            connected: AtomicBool::new(false),
        }
    }

    /// Sets the interval between checks inside a bounded wait.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Runs every probe once and records the verdict.
    pub async fn refresh(&self) -> bool {
        let results = run_probes(&self.probes, &self.client).await;
        let connected = results.iter().any(|r| r.success);
        self.connected.store(connected, Ordering::Relaxed);

        debug!(connected, probes = results.len(), "Connectivity probes finished");
        connected
    }
}

#[async_trait]
impl Connectivity for ProbeConnectivity {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn wait_for_connection(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            if self.refresh().await {
                return true;
            }
            if Instant::now() + self.poll_interval > deadline {
                return false;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
