#![deny(unsafe_code)]

//! Server list storage, selection, and validation for clashctl.
//!
//! Loads and saves the TOML file that records every known daemon server
//! and which one is currently selected. Provides the [`CtlConfig`] type as
//! the central configuration structure, the [`store`] module for file
//! persistence, and the [`form`] module for field-level input checks.

/// Field validators used by the interactive `server add` form.
pub mod form;
/// File-backed load/save and validated mutations.
pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

pub use store::ConfigStore;

/// Errors that can occur during configuration loading, validation and mutation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("server `{0}` not found")]
    NotFound(String),

    #[error("no server selected (run `use <server>`)")]
    NoSelection,

    #[error("selected server `{0}` is not in the server list")]
    SelectedMissing(String),

    #[error("cannot remove the selected server `{0}`")]
    RemoveSelected(String),

    #[error("cannot locate the home directory")]
    NoHomeDir,
}

/// Top-level clashctl configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtlConfig {
    /// Name of the currently selected server (empty when none).
    #[serde(default)]
    pub selected: String,

    /// Known daemon servers keyed by name.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,

    /// Interactive shell presentation settings.
    #[serde(default)]
    pub ui: UiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A remote daemon endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or address.
    pub host: String,

    /// Controller port. Accepts an integer or a quoted string in TOML.
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,

    /// Shared secret sent as a bearer credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Whether the controller API is served over TLS.
    #[serde(default)]
    pub https: bool,
}

impl ServerConfig {
    /// Create a plain-HTTP server entry without a secret.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secret: None,
            https: false,
        }
    }

    /// Attach a shared secret. An empty secret clears it.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        self.secret = if secret.is_empty() { None } else { Some(secret) };
        self
    }

    /// Serve the API over TLS.
    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Base URL of the HTTP API, e.g. `http://127.0.0.1:9090`.
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Base URL of the streaming socket API, e.g. `ws://127.0.0.1:9090`.
    pub fn websocket_url(&self) -> String {
        let scheme = if self.https { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u16),
        Text(String),
    }

    match RawPort::deserialize(deserializer)? {
        RawPort::Number(port) => Ok(port),
        RawPort::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid port {text:?}: {e}"))),
    }
}

/// Interactive shell presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Minimum time a successful `ping` row keeps showing "loading".
    #[serde(default = "default_ping_min_display_ms")]
    pub ping_min_display_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            ping_min_display_ms: default_ping_min_display_ms(),
        }
    }
}

fn default_ping_min_display_ms() -> u64 {
    100
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "warn", "info", "debug").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl CtlConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: CtlConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    ///
    /// A dangling `selected` name is not rejected here; it surfaces from
    /// [`CtlConfig::selected_server`] when something actually needs it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, server) in &self.servers {
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "server names must not be empty".to_string(),
                ));
            }
            if server.host.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "servers.{name}.host must not be empty"
                )));
            }
            if server.port == 0 {
                return Err(ConfigError::Validation(format!(
                    "servers.{name}.port must be non-zero"
                )));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {:?}, got {:?}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }

    /// Resolve the selected server.
    pub fn selected_server(&self) -> Result<(&str, &ServerConfig), ConfigError> {
        if self.selected.is_empty() {
            return Err(ConfigError::NoSelection);
        }
        self.servers
            .get_key_value(&self.selected)
            .map(|(name, server)| (name.as_str(), server))
            .ok_or_else(|| ConfigError::SelectedMissing(self.selected.clone()))
    }

    /// Add a new server. Names must be non-empty and unique.
    pub fn insert_server(&mut self, name: &str, server: ServerConfig) -> Result<(), ConfigError> {
        form::validate_name(name, self)?;
        form::validate_host(&server.host)?;
        if server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.servers.insert(name.to_string(), server);
        Ok(())
    }

    /// Remove a server. The selected server cannot be removed.
    pub fn remove_server(&mut self, name: &str) -> Result<ServerConfig, ConfigError> {
        if !self.servers.contains_key(name) {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        if name == self.selected {
            return Err(ConfigError::RemoveSelected(name.to_string()));
        }
        self.servers
            .remove(name)
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    /// Change the selected server.
    pub fn select(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.servers.contains_key(name) {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        self.selected = name.to_string();
        Ok(())
    }

    /// Server names in storage order.
    pub fn server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }
}
