#![deny(unsafe_code)]

//! clashctl core library.
//!
//! Talks to a Clash-compatible daemon over its HTTP API and builds the
//! pieces the interactive shell is made of: the proxy catalog, the indexed
//! selection table, concurrent latency benchmarking, server pings, the live
//! traffic stream, and the command tree used for tab completion.

use std::future::Future;
use std::pin::Pin;

/// A boxed, `Send` future for async trait methods behind `dyn Trait`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Concurrent latency probing of proxies.
pub mod bench;
/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Proxy map fetching and selector group lookup.
pub mod catalog;
/// Typed HTTP client for one daemon server.
pub mod client;
/// Error taxonomy.
pub mod error;
/// Concurrent reachability check of configured servers.
pub mod ping;
/// Completion sources backed by the config file and the daemon.
pub mod providers;
/// Tables and value formatting for terminal output.
pub mod render;
/// Indexed, delay-sorted view of the current selector group.
pub mod selection;
/// Live traffic websocket stream.
pub mod traffic;
/// Command hierarchy and completion.
pub mod tree;
/// Daemon API data types.
pub mod types;

pub use bench::{BenchmarkEngine, ProbeOutcome};
pub use catalog::{Catalog, ProxyCatalog};
pub use client::DaemonClient;
pub use error::CtlError;
pub use ping::{PingOptions, PingState};
pub use selection::{SelectionState, SelectionTable};
pub use traffic::TrafficStream;
pub use tree::{ChildProvider, CommandNode, CommandTree, Suggestion};
pub use types::{Mode, Proxy, ProxyKind};
