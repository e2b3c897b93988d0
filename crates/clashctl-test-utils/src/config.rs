//! Configuration builders for tests.

use clashctl_config::{CtlConfig, ServerConfig};

/// Fluent builder for [`CtlConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .server("us1", ServerConfig::new("10.0.0.1", 9090))
///     .selected("us1")
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: CtlConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CtlConfig::default(),
        }
    }

    pub fn server(mut self, name: &str, server: ServerConfig) -> Self {
        self.config.servers.insert(name.to_string(), server);
        self
    }

    pub fn selected(mut self, name: &str) -> Self {
        self.config.selected = name.to_string();
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn ping_min_display_ms(mut self, ms: u64) -> Self {
        self.config.ui.ping_min_display_ms = ms;
        self
    }

    pub fn build(self) -> CtlConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
