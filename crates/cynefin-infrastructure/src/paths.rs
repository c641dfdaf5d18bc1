//! Unified path management for cynefin files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/cynefin/           # Config directory
//! └── config.toml              # Store configuration
//!
//! ~/.local/share/cynefin/      # Data directory
//! └── history/                 # FileBackend root
//!     ├── cynefin.history.index.json
//!     └── cynefin.history.results.json
//! ```
//!
//! A root override places both trees under one directory, which is what
//! tests and portable installs use.

use cynefin_core::CynefinError;
use cynefin_core::error::Result;
use std::path::PathBuf;

const APP_DIR: &str = "cynefin";

/// Resolves configuration and data locations.
#[derive(Debug, Clone, Default)]
pub struct CynefinPaths {
    root_override: Option<PathBuf>,
}

impl CynefinPaths {
    /// Creates a resolver. With `Some(root)`, every path lives under `root`
    /// instead of the platform directories.
    pub fn new(root_override: Option<PathBuf>) -> Self {
        Self { root_override }
    }

    /// Returns the configuration directory (e.g. `~/.config/cynefin/`).
    pub fn config_dir(&self) -> Result<PathBuf> {
        match &self.root_override {
            Some(root) => Ok(root.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| CynefinError::config("Cannot find config directory")),
        }
    }

    /// Returns the data directory (e.g. `~/.local/share/cynefin/`).
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.root_override {
            Some(root) => Ok(root.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| CynefinError::config("Cannot find data directory")),
        }
    }

    /// Returns the path to the configuration file.
    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the default `FileBackend` directory.
    pub fn history_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("history"))
    }
}
