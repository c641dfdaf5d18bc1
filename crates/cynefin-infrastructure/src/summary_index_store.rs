//! Persistence of the summary index blob.

use crate::codec::JsonCodec;
use crate::dto::{SESSION_SUMMARY_ENTITY, SESSION_SUMMARY_VERSION, create_session_summary_migrator};
use crate::storage::{StorageAdapter, WriteOutcome};
use cynefin_core::error::Result;
use cynefin_core::session::SessionSummary;
use serde_json::Value;
use version_migrate::Migrator;

/// Version assumed for entries written before entries carried a tag.
const UNTAGGED_VERSION: &str = "1.0.0";

/// Loads and persists the ordered summary index under a single key.
///
/// The blob is a JSON array of flat, version-tagged entries. Each entry is
/// migrated to the current schema on its own, so one unreadable entry is
/// skipped without losing the rest. A blob that is not a JSON array at all
/// is treated as an empty index.
pub struct SummaryIndexStore {
    storage: StorageAdapter,
    key: String,
    migrator: Migrator,
}

impl SummaryIndexStore {
    /// # Errors
    ///
    /// Returns an error if the summary migration path cannot be registered.
    pub fn new(storage: StorageAdapter, key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            storage,
            key: key.into(),
            migrator: create_session_summary_migrator()?,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the index, falling back to an empty list on any failure.
    pub fn load(&self) -> Vec<SessionSummary> {
        let raw = self.storage.get(&self.key);
        let entries: Vec<Value> = JsonCodec::decode(raw.as_deref(), Vec::new());

        let mut migrated = 0usize;
        let mut summaries = Vec::with_capacity(entries.len());
        for mut entry in entries {
            Self::tag_untagged(&mut entry);
            let is_current =
                entry.get("version").and_then(Value::as_str) == Some(SESSION_SUMMARY_VERSION);

            let loaded: std::result::Result<SessionSummary, _> =
                self.migrator.load_flat_from(SESSION_SUMMARY_ENTITY, entry);
            match loaded {
                Ok(summary) => {
                    if !is_current {
                        migrated += 1;
                    }
                    summaries.push(summary);
                }
                Err(e) => tracing::warn!(
                    "Skipping unreadable entry in history index '{}': {}",
                    self.key,
                    e
                ),
            }
        }

        if migrated > 0 {
            tracing::info!(
                "Migrated {} history summaries to V{}",
                migrated,
                SESSION_SUMMARY_VERSION
            );
        }

        summaries
    }

    /// Persists `summaries` verbatim, in order.
    pub fn persist(&self, summaries: &[SessionSummary]) -> WriteOutcome {
        let mut entries = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let saved = self
                .migrator
                .save_domain_flat(SESSION_SUMMARY_ENTITY, summary)
                .ok()
                .and_then(|json_str| JsonCodec::try_decode::<Value>(&json_str));
            match saved {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::warn!("Could not encode summary '{}' for the history index", summary.id);
                    return WriteOutcome::Rejected;
                }
            }
        }

        match JsonCodec::encode(&entries) {
            Some(raw) => self.storage.set(&self.key, &raw),
            None => WriteOutcome::Rejected,
        }
    }

    /// Erases the index key.
    pub fn erase(&self) {
        self.storage.remove(&self.key);
    }

    /// Tags an object entry that has no `"version"` field as 1.0.0.
    fn tag_untagged(entry: &mut Value) {
        if let Some(fields) = entry.as_object_mut()
            && !fields.contains_key("version")
        {
            fields.insert(
                "version".to_string(),
                Value::String(UNTAGGED_VERSION.to_string()),
            );
        }
    }
}
