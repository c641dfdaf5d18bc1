//! Failure-absorbing wrapper around a `KeyValueBackend`.

use cynefin_core::KeyValueBackend;
use std::sync::Arc;

/// Result of a write through the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The backend accepted the value.
    Stored,
    /// The backend refused or failed the write; the previous value, if
    /// any, is still in place.
    Rejected,
}

impl WriteOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, WriteOutcome::Stored)
    }
}

/// Persistent backend adapter.
///
/// Turns every backend error into a logged, non-fatal outcome:
/// - `get` yields `None`
/// - `set` yields `WriteOutcome::Rejected`
/// - `remove` does nothing
///
/// This lets the stores above run their quota-recovery logic as ordinary
/// control flow.
#[derive(Clone)]
pub struct StorageAdapter {
    backend: Arc<dyn KeyValueBackend>,
}

impl StorageAdapter {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read '{}' from history backend: {}", key, e);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) -> WriteOutcome {
        match self.backend.set(key, value) {
            Ok(()) => {
                tracing::debug!("Stored '{}' ({} bytes)", key, value.len());
                WriteOutcome::Stored
            }
            Err(e) if e.is_quota_exceeded() => {
                tracing::warn!("History backend quota exceeded: {}", e);
                WriteOutcome::Rejected
            }
            Err(e) => {
                tracing::warn!("Failed to write '{}' to history backend: {}", key, e);
                WriteOutcome::Rejected
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            tracing::warn!("Failed to remove '{}' from history backend: {}", key, e);
        }
    }
}
