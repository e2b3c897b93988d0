//! Concurrent latency probing.
//!
//! Every member is probed in its own task; the engine waits for all of them.
//! Probe failures never abort the run.

use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::DaemonClient;
use crate::error::CtlError;
use crate::types::{DelaySample, Proxy};

/// URL the daemon fetches through each proxy.
pub const DEFAULT_PROBE_URL: &str = "http://cp.cloudflare.com/generate_204";

/// Timeout the daemon applies to one probe, in milliseconds.
pub const PROBE_TIMEOUT_MS: u64 = 3000;

/// Client-side bound on one probe request.
pub const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of probing one proxy.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub name: String,
    /// Delay in milliseconds, always positive on success.
    pub result: Result<u64, CtlError>,
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Probe settings shared by every task of a run.
#[derive(Debug, Clone)]
pub struct BenchmarkEngine {
    url: String,
    timeout_ms: u64,
    request_timeout: Duration,
}

impl Default for BenchmarkEngine {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROBE_URL.to_string(),
            timeout_ms: PROBE_TIMEOUT_MS,
            request_timeout: PROBE_REQUEST_TIMEOUT,
        }
    }
}

impl BenchmarkEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Probe one proxy by name.
    pub async fn probe(&self, client: &DaemonClient, name: &str) -> Result<u64, CtlError> {
        let resp = client
            .proxy_delay(name, &self.url, self.timeout_ms, self.request_timeout)
            .await?;
        match resp.delay {
            0 => Err(CtlError::Daemon(format!("no delay reported for {name}"))),
            delay => Ok(delay),
        }
    }

    /// Probe every proxy concurrently.
    ///
    /// A successful probe appends a sample to that proxy's history; a failed
    /// one leaves the history untouched. `on_complete` runs once per finished
    /// probe in completion order. Returns after every probe has finished.
    pub async fn run<F>(
        &self,
        client: &DaemonClient,
        proxies: &mut [Proxy],
        mut on_complete: F,
    ) -> Vec<ProbeOutcome>
    where
        F: FnMut(&ProbeOutcome),
    {
        let mut tasks = JoinSet::new();
        for (index, proxy) in proxies.iter().enumerate() {
            let engine = self.clone();
            let client = client.clone();
            let name = proxy.name.clone();
            tasks.spawn(async move {
                let result = engine.probe(&client, &name).await;
                (index, ProbeOutcome { name, result })
            });
        }

        let mut outcomes = Vec::with_capacity(proxies.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    warn!(error = %e, "probe task did not finish");
                    continue;
                }
            };
            match &outcome.result {
                Ok(delay) => {
                    debug!(proxy = %outcome.name, delay, "probe succeeded");
                    proxies[index].history.push(DelaySample::new(*delay));
                }
                Err(e) => debug!(proxy = %outcome.name, error = %e, "probe failed"),
            }
            on_complete(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }
}
