//! Store configuration
//!
//! Where the task blob lives. Values come from defaults or from the
//! `VITAWAVE_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use crate::persistence::{TaskPersistence, DEFAULT_TASKS_KEY};
use crate::provider::TaskStoreProvider;
use crate::storage::{validate_key, FileKeyValueStore};
use crate::{Error, Result};

pub const DATA_DIR_ENV: &str = "VITAWAVE_DATA_DIR";
pub const STORAGE_KEY_ENV: &str = "VITAWAVE_STORAGE_KEY";
pub const DEFAULT_DATA_DIR: &str = ".vitawave-data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one file per storage key
    pub data_dir: PathBuf,
    /// Key the task collection is stored under
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_TASKS_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source; blank values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(dir) = read(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = read(STORAGE_KEY_ENV) {
            config.storage_key = key;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_key(&self.storage_key)
            .map_err(|_| Error::Config(format!("Invalid storage key: {:?}", self.storage_key)))
    }

    /// File-backed persistence for this configuration
    pub fn persistence(&self) -> Result<TaskPersistence> {
        self.validate()?;
        let store = Arc::new(FileKeyValueStore::new(&self.data_dir));
        Ok(TaskPersistence::new(store, self.storage_key.clone()))
    }

    /// Open and initialize a provider on this configuration
    pub async fn open_provider(&self) -> Result<TaskStoreProvider> {
        Ok(TaskStoreProvider::open(self.persistence()?).await)
    }
}
