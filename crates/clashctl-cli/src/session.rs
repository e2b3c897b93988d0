//! State that lives for one shell session.

use std::time::Duration;

use clashctl_config::ConfigStore;
use clashctl_core::{BenchmarkEngine, CtlError, DaemonClient, SelectionState};

/// Mutable state shared by every command of a session.
pub struct Session {
    pub store: ConfigStore,
    /// The selector table the user last listed.
    pub selection: SelectionState,
    pub engine: BenchmarkEngine,
    /// Applied after a successful ping; read from `[ui]` at startup.
    pub ping_min_display: Duration,
}

impl Session {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            selection: SelectionState::new(),
            engine: BenchmarkEngine::new(),
            ping_min_display: clashctl_core::ping::DEFAULT_MIN_DISPLAY,
        }
    }

    pub fn with_ping_min_display(mut self, min_display: Duration) -> Self {
        self.ping_min_display = min_display;
        self
    }

    pub fn with_engine(mut self, engine: BenchmarkEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Client for the server selected right now in the config file.
    pub async fn client(&self) -> Result<DaemonClient, CtlError> {
        DaemonClient::for_selected(&self.store).await
    }

    /// Forget the selector table, e.g. after switching servers.
    pub fn reset_selection(&mut self) {
        self.selection = SelectionState::new();
    }
}
