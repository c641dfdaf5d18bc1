use anyhow::{Context, Result};
use cynefin_application::HistoryStore;
use cynefin_infrastructure::paths::CynefinPaths;
use cynefin_infrastructure::{ConfigService, CynefinConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub root: Option<PathBuf>,
    pub cap: Option<usize>,
}

impl StoreOptions {
    pub fn config_service(&self) -> ConfigService {
        ConfigService::new(CynefinPaths::new(self.root.clone()))
    }

    /// Loads the configuration file with the `--cap` override applied.
    pub fn load_config(&self) -> Result<CynefinConfig> {
        let service = self.config_service();
        let mut config = service.load().context("Failed to load configuration")?;
        if let Some(cap) = self.cap {
            config.history.cap = cap;
        }
        Ok(config)
    }
}

/// Opens the history store described by the configuration file.
pub fn open_store(options: &StoreOptions) -> Result<HistoryStore> {
    let config = options.load_config()?;
    let backend = options
        .config_service()
        .open_backend(&config)
        .context("Failed to open history directory")?;

    tracing::debug!("Using history directory {:?}", backend.base_dir());

    HistoryStore::open(Arc::new(backend), config.history).context("Invalid history configuration")
}

/// Shortens `text` to at most `max` characters for table output.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
