//! Temporary config stores.

use std::path::PathBuf;

use clashctl_config::{ConfigStore, CtlConfig};
use tempfile::TempDir;

/// A [`ConfigStore`] inside a temp directory that is removed on drop.
pub struct TestStore {
    pub store: ConfigStore,
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TestStore {
    /// A store whose file holds `config`.
    pub async fn with_config(config: &CtlConfig) -> Self {
        let this = Self::empty().await;
        this.store
            .save(config)
            .await
            .expect("failed to write test config");
        this
    }

    /// A store with an initialized, empty file.
    pub async fn empty() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let path = temp_dir.path().join("clash").join("ctl.toml");
        let store = ConfigStore::new(&path);
        store.init().await.expect("failed to init test store");
        Self {
            store,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Raw file content.
    pub async fn contents(&self) -> String {
        tokio::fs::read_to_string(&self.path)
            .await
            .expect("failed to read test config")
    }
}
