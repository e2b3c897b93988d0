//! Build metadata embedded by the build script, shown by `--version`.

use chrono::{DateTime, Utc};

/// Short git commit hash, or `unknown` outside a checkout.
pub const GIT_HASH: &str = env!("CLASHCTL_GIT_HASH");

/// Build time as Unix seconds.
pub const BUILD_TIMESTAMP: &str = env!("CLASHCTL_BUILD_TIMESTAMP");

/// `debug` or `release`.
pub const BUILD_PROFILE: &str = env!("CLASHCTL_BUILD_PROFILE");

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build time, if the embedded timestamp is valid.
pub fn built_at() -> Option<DateTime<Utc>> {
    BUILD_TIMESTAMP
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// e.g. `0.1.0 (abc1234, debug, built 2026-01-02)`
pub fn version_string() -> String {
    match built_at() {
        Some(at) => format!(
            "{VERSION} ({GIT_HASH}, {BUILD_PROFILE}, built {})",
            at.format("%Y-%m-%d")
        ),
        None => format!("{VERSION} ({GIT_HASH}, {BUILD_PROFILE})"),
    }
}
