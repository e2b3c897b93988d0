//! Error taxonomy shared by every clashctl operation.
//!
//! Each variant is shown to the user as a single line; none of them end the
//! shell session.

use clashctl_config::ConfigError;

/// Errors from daemon access, selection, and input parsing.
#[derive(Debug, thiserror::Error)]
pub enum CtlError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("daemon error: {0}")]
    Daemon(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("the selector table is not initialized (run `proxy ls` first)")]
    NotInitialized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("id {id} out of range (table has {len} entries)")]
    OutOfRange { id: usize, len: usize },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("no rule-based selector found")]
    NoSelectorFound,

    #[error(transparent)]
    Config(#[from] ConfigError),
}
