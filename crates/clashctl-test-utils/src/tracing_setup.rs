//! Tracing for tests.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset: the workspace crates at debug,
/// dependencies at warn.
pub const DEFAULT_TEST_FILTER: &str = "warn,clashctl_core=debug,clashctl_config=debug";

/// Route tracing output to the test harness writer.
///
/// Idempotent; every test may call it. Tests annotated with
/// `#[test_log::test]` do not need it.
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .try_init();
}
