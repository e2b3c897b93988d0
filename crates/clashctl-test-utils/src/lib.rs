#![deny(unsafe_code)]

//! Shared test utilities for the clashctl workspace.
//!
//! Provides a mock daemon, config builders, temporary config stores, and
//! tracing helpers so that individual crate tests stay concise.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! clashctl-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod daemon;
pub mod store;
pub mod tracing_setup;

pub use config::TestConfigBuilder;
pub use daemon::{DelayScript, MockDaemon, RecordedRequest};
pub use store::TestStore;
