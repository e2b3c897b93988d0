//! File-backed configuration store.
//!
//! Every read goes to disk so that callers (including tab completion)
//! always see the latest saved state. Mutations load, validate, and write
//! back; a failed validation never touches the file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, CtlConfig, ServerConfig};

/// Directory name under `$HOME/.config`.
pub const CONFIG_DIR_NAME: &str = "clash";

/// File name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "ctl.toml";

/// Loads and saves [`CtlConfig`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$HOME/.config/clash/ctl.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home
            .join(".config")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the parent directory and an empty file if they do not exist.
    pub async fn init(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        if !tokio::fs::try_exists(&self.path).await? {
            debug!(path = %self.path.display(), "creating empty config file");
            tokio::fs::write(&self.path, b"").await?;
        }
        Ok(())
    }

    /// Load configuration from disk.
    pub async fn load(&self) -> Result<CtlConfig, ConfigError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        CtlConfig::parse(&content)
    }

    /// Validate and write configuration to disk.
    pub async fn save(&self, config: &CtlConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let content = config.to_toml()?;
        tokio::fs::write(&self.path, content).await?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Add a server and persist.
    pub async fn add_server(&self, name: &str, server: ServerConfig) -> Result<(), ConfigError> {
        let mut config = self.load().await?;
        config.insert_server(name, server)?;
        self.save(&config).await
    }

    /// Remove a server and persist. The selected server is never removed.
    pub async fn remove_server(&self, name: &str) -> Result<(), ConfigError> {
        let mut config = self.load().await?;
        config.remove_server(name)?;
        self.save(&config).await
    }

    /// Select a server and persist.
    pub async fn select_server(&self, name: &str) -> Result<(), ConfigError> {
        let mut config = self.load().await?;
        config.select(name)?;
        self.save(&config).await
    }

    /// Load and resolve the selected server.
    pub async fn selected_server(&self) -> Result<(String, ServerConfig), ConfigError> {
        let config = self.load().await?;
        let (name, server) = config.selected_server()?;
        Ok((name.to_string(), server.clone()))
    }
}
