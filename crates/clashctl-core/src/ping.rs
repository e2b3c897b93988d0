//! Reachability check across every configured server.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use clashctl_config::ServerConfig;

use crate::client::DaemonClient;

/// Bound on one liveness request.
pub const PING_TIMEOUT: Duration = Duration::from_secs(3);

/// Default minimum time a server shows as loading before turning green.
pub const DEFAULT_MIN_DISPLAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingState {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy)]
pub struct PingOptions {
    pub timeout: Duration,
    /// Delay applied after a success, so fast servers do not flicker.
    pub min_display: Duration,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            timeout: PING_TIMEOUT,
            min_display: DEFAULT_MIN_DISPLAY,
        }
    }
}

/// Ping every server concurrently.
///
/// `on_update` first sees every server as [`PingState::Loading`] in name
/// order, then once more per server with its final state in completion
/// order. Returns the final states in name order; none is left loading.
pub async fn ping_all<F>(
    servers: &BTreeMap<String, ServerConfig>,
    options: PingOptions,
    mut on_update: F,
) -> Vec<(String, PingState)>
where
    F: FnMut(usize, &str, PingState),
{
    let mut states: Vec<(String, PingState)> = servers
        .keys()
        .map(|name| (name.clone(), PingState::Loading))
        .collect();
    for (index, (name, state)) in states.iter().enumerate() {
        on_update(index, name, *state);
    }

    let mut tasks = JoinSet::new();
    for (index, (name, server)) in servers.iter().enumerate() {
        let server = server.clone();
        let name = name.clone();
        tasks.spawn(async move {
            let state = match ping_one(&server, options).await {
                Ok(()) => PingState::Success,
                Err(e) => {
                    debug!(server = %name, error = %e, "ping failed");
                    PingState::Error
                }
            };
            (index, state)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, state)) => {
                states[index].1 = state;
                on_update(index, &states[index].0, state);
            }
            Err(e) => warn!(error = %e, "ping task did not finish"),
        }
    }

    for (index, (name, state)) in states.iter_mut().enumerate() {
        if *state == PingState::Loading {
            *state = PingState::Error;
            on_update(index, name, PingState::Error);
        }
    }
    states
}

async fn ping_one(server: &ServerConfig, options: PingOptions) -> Result<(), crate::CtlError> {
    let client = DaemonClient::with_timeout(server, options.timeout)?;
    client.version(options.timeout).await?;
    tokio::time::sleep(options.min_display).await;
    Ok(())
}
