//! Configuration file loading.
//!
//! ```toml
//! [history]
//! cap = 50
//! index_key = "cynefin.history.index"
//! results_key = "cynefin.history.results"
//! # retry_keep = 25
//!
//! [storage]
//! # dir = "/var/lib/cynefin/history"
//! quota_bytes = 5242880
//! ```
//!
//! Every key is optional; a missing file means defaults.

use crate::backend::FileBackend;
use crate::paths::CynefinPaths;
use crate::storage::AtomicTomlFile;
use cynefin_core::error::Result;
use cynefin_core::history::HistoryConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and how much the file backend stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Backend directory; defaults to `<data_dir>/history`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Total size budget for all stored blobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,
}

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CynefinConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Loads and saves `config.toml` and builds the configured backend.
pub struct ConfigService {
    paths: CynefinPaths,
}

impl ConfigService {
    pub fn new(paths: CynefinPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &CynefinPaths {
        &self.paths
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// missing or empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// resulting history configuration is invalid.
    pub fn load(&self) -> Result<CynefinConfig> {
        let file = AtomicTomlFile::<CynefinConfig>::new(self.paths.config_file()?);
        let config = match file.load()? {
            Some(config) => config,
            None => {
                tracing::debug!("No config at {:?}, using defaults", file.path());
                CynefinConfig::default()
            }
        };

        config.history.validate()?;
        Ok(config)
    }

    /// Writes `config` back to disk atomically.
    pub fn save(&self, config: &CynefinConfig) -> Result<()> {
        config.history.validate()?;
        AtomicTomlFile::new(self.paths.config_file()?).save(config)
    }

    /// Changes the history cap, creating the file if needed.
    pub fn set_cap(&self, cap: usize) -> Result<()> {
        HistoryConfig::with_cap(cap).validate()?;
        AtomicTomlFile::new(self.paths.config_file()?).update(CynefinConfig::default(), |config| {
            config.history.cap = cap;
            Ok(())
        })
    }

    /// Opens the file backend described by `config`.
    pub fn open_backend(&self, config: &CynefinConfig) -> Result<FileBackend> {
        let dir = match &config.storage.dir {
            Some(dir) => dir.clone(),
            None => self.paths.history_dir()?,
        };

        let backend = FileBackend::new(&dir)?;
        Ok(match config.storage.quota_bytes {
            Some(quota) => backend.with_quota(quota),
            None => backend,
        })
    }
}
