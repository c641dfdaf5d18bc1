//! History store configuration.

use crate::error::{CynefinError, Result};
use serde::{Deserialize, Serialize};

/// Default number of sessions retained by both tiers.
pub const DEFAULT_CAP: usize = 50;

/// Default backend key of the summary index blob.
pub const DEFAULT_INDEX_KEY: &str = "cynefin.history.index";

/// Default backend key of the result blob map.
pub const DEFAULT_RESULTS_KEY: &str = "cynefin.history.results";

/// Capacity and key namespace of a history store.
///
/// `cap` governs the summary index and the result blob map identically.
/// `retry_keep` is how many of the newest results survive the second write
/// attempt after a backend rejects the first one; `None` means half the cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_cap")]
    pub cap: usize,
    #[serde(default = "default_index_key")]
    pub index_key: String,
    #[serde(default = "default_results_key")]
    pub results_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_keep: Option<usize>,
}

fn default_cap() -> usize {
    DEFAULT_CAP
}

fn default_index_key() -> String {
    DEFAULT_INDEX_KEY.to_string()
}

fn default_results_key() -> String {
    DEFAULT_RESULTS_KEY.to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            index_key: default_index_key(),
            results_key: default_results_key(),
            retry_keep: None,
        }
    }
}

impl HistoryConfig {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    /// Number of newest results kept when retrying a rejected write.
    ///
    /// Always at least 1 and never more than `cap`.
    pub fn retry_budget(&self) -> usize {
        let budget = self.retry_keep.unwrap_or_else(|| self.cap.div_ceil(2));
        budget.clamp(1, self.cap.max(1))
    }

    /// Checks the configuration for values the store cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.cap == 0 {
            return Err(CynefinError::config("history cap must be at least 1"));
        }
        if self.index_key.trim().is_empty() || self.results_key.trim().is_empty() {
            return Err(CynefinError::config("history backend keys must not be empty"));
        }
        if self.index_key == self.results_key {
            return Err(CynefinError::config(format!(
                "index and results must use different keys (both are '{}')",
                self.index_key
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HistoryConfig::default();

        assert_eq!(config.cap, 50);
        assert_eq!(config.index_key, "cynefin.history.index");
        assert_eq!(config.results_key, "cynefin.history.results");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retry_budget() {
        assert_eq!(HistoryConfig::with_cap(50).retry_budget(), 25);
        assert_eq!(HistoryConfig::with_cap(3).retry_budget(), 2);
        assert_eq!(HistoryConfig::with_cap(1).retry_budget(), 1);

        let config = HistoryConfig {
            retry_keep: Some(100),
            ..HistoryConfig::with_cap(10)
        };
        assert_eq!(config.retry_budget(), 10);

        let config = HistoryConfig {
            retry_keep: Some(0),
            ..HistoryConfig::with_cap(10)
        };
        assert_eq!(config.retry_budget(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(HistoryConfig::with_cap(0).validate().unwrap_err().is_config());

        let same_keys = HistoryConfig {
            results_key: DEFAULT_INDEX_KEY.to_string(),
            ..HistoryConfig::default()
        };
        assert!(same_keys.validate().is_err());

        let empty_key = HistoryConfig {
            index_key: " ".to_string(),
            ..HistoryConfig::default()
        };
        assert!(empty_key.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: HistoryConfig = toml::from_str("cap = 5").unwrap();

        assert_eq!(config.cap, 5);
        assert_eq!(config.index_key, DEFAULT_INDEX_KEY);
        assert_eq!(config.retry_keep, None);
    }
}
