//! Persistence of the result blob map.
//!
//! All full results live in one insertion-ordered JSON object under a single
//! backend key. Keeping them in one value bounds the number of keys and
//! makes quota recovery a matter of rewriting one blob.

use crate::codec::JsonCodec;
use crate::storage::{StorageAdapter, WriteOutcome};
use cynefin_core::history::HistoryConfig;
use cynefin_core::session::FullResult;
use indexmap::IndexMap;
use serde_json::Value;

/// Id → result, oldest first.
pub type ResultMap = IndexMap<String, FullResult>;

/// How a `put` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobWriteStatus {
    /// The merged map was written on the first attempt.
    Persisted,
    /// The first write was rejected; older entries were dropped and the
    /// second write succeeded.
    PersistedAfterEviction,
    /// Both writes were rejected. Persisted state is unchanged.
    Abandoned,
}

/// Outcome of a `put`, with the ids dropped from the persisted map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobWriteReport {
    pub status: BlobWriteStatus,
    /// Ids removed from the persisted map by this write, oldest first.
    /// Always empty when the write was abandoned.
    pub evicted: Vec<String>,
}

impl BlobWriteReport {
    pub fn is_persisted(&self) -> bool {
        !matches!(self.status, BlobWriteStatus::Abandoned)
    }

    fn abandoned() -> Self {
        Self {
            status: BlobWriteStatus::Abandoned,
            evicted: Vec::new(),
        }
    }
}

/// The result blob map tier.
///
/// Every mutation is a read-modify-write against the persisted map, not an
/// in-memory copy, so entries written by another process since this one
/// started are kept (last writer still wins on a true race).
pub struct ResultBlobStore {
    storage: StorageAdapter,
    key: String,
    cap: usize,
    retry_keep: usize,
}

impl ResultBlobStore {
    pub fn new(storage: StorageAdapter, config: &HistoryConfig) -> Self {
        Self {
            storage,
            key: config.results_key.clone(),
            cap: config.cap,
            retry_keep: config.retry_budget(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the whole map. Absent or corrupt blobs yield an empty map;
    /// individual entries that fail to parse are skipped.
    pub fn load_all(&self) -> ResultMap {
        let raw = self.storage.get(&self.key);
        let entries: IndexMap<String, Value> = JsonCodec::decode(raw.as_deref(), IndexMap::new());

        entries
            .into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<FullResult>(value) {
                Ok(result) => Some((id, result)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable result '{}': {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Fetches a single result from the persisted map.
    pub fn get(&self, id: &str) -> Option<FullResult> {
        self.load_all().shift_remove(id)
    }

    /// Merges `result` into the persisted map under `id` and writes it back.
    ///
    /// 1. The entry becomes the newest (re-puts move to the end).
    /// 2. The oldest entries beyond the cap are dropped.
    /// 3. If the backend rejects the write, the map is cut to its newest
    ///    half (never more than the retry budget, never less than the new
    ///    entry) and written once more. If that fails too the write is
    ///    abandoned.
    pub fn put(&self, id: &str, result: FullResult) -> BlobWriteReport {
        let mut map = self.load_all();
        map.shift_remove(id);
        map.insert(id.to_string(), result);

        let mut evicted = evict_oldest(&mut map, self.cap);

        if self.write(&map).is_stored() {
            log_evicted(&evicted, "capacity");
            return BlobWriteReport {
                status: BlobWriteStatus::Persisted,
                evicted,
            };
        }

        let keep = self.retry_keep.min(map.len().div_ceil(2)).max(1);
        let dropped = evict_oldest(&mut map, keep);
        tracing::warn!(
            "Result map write rejected; retrying with {} newest of {} entries",
            map.len(),
            map.len() + dropped.len()
        );
        evicted.extend(dropped);

        if self.write(&map).is_stored() {
            log_evicted(&evicted, "storage pressure");
            BlobWriteReport {
                status: BlobWriteStatus::PersistedAfterEviction,
                evicted,
            }
        } else {
            tracing::warn!(
                "Result map write abandoned; result '{}' is only held in memory",
                id
            );
            BlobWriteReport::abandoned()
        }
    }

    /// Removes `id` from the persisted map.
    ///
    /// Returns `false` without writing if the id was not present.
    pub fn remove(&self, id: &str) -> bool {
        let mut map = self.load_all();
        if map.shift_remove(id).is_none() {
            return false;
        }
        if !self.write(&map).is_stored() {
            tracing::warn!("Failed to persist removal of result '{}'", id);
        }
        true
    }

    /// Keeps only the entries for which `keep` returns true.
    ///
    /// Returns the removed ids; writes only if something was removed.
    pub fn retain<F>(&self, keep: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut map = self.load_all();
        let removed: Vec<String> = map.keys().filter(|id| !keep(id)).cloned().collect();
        if removed.is_empty() {
            return removed;
        }

        map.retain(|id, _| keep(id));
        if !self.write(&map).is_stored() {
            tracing::warn!("Failed to persist removal of {} orphaned results", removed.len());
        }
        removed
    }

    /// Erases the results key.
    pub fn erase(&self) {
        self.storage.remove(&self.key);
    }

    fn write(&self, map: &ResultMap) -> WriteOutcome {
        match JsonCodec::encode(map) {
            Some(raw) => self.storage.set(&self.key, &raw),
            None => WriteOutcome::Rejected,
        }
    }
}

/// Drops the oldest entries until at most `keep` remain.
fn evict_oldest(map: &mut ResultMap, keep: usize) -> Vec<String> {
    let excess = map.len().saturating_sub(keep);
    map.drain(..excess).map(|(id, _)| id).collect()
}

fn log_evicted(evicted: &[String], reason: &str) {
    if !evicted.is_empty() {
        tracing::warn!("Evicted results due to {}: {:?}", reason, evicted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use cynefin_core::error::Result;
    use cynefin_core::session::{AnalysisOutcome, CynefinDomain};
    use cynefin_core::{CynefinError, KeyValueBackend};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result(narrative: &str) -> FullResult {
        FullResult::new(CynefinDomain::Complex, 0.6, AnalysisOutcome::Absent).with_narrative(narrative)
    }

    fn store(backend: Arc<dyn KeyValueBackend>, cap: usize) -> ResultBlobStore {
        ResultBlobStore::new(StorageAdapter::new(backend), &HistoryConfig::with_cap(cap))
    }

    fn keys(map: &ResultMap) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    /// Rejects the first `failures` writes, then accepts.
    struct FlakyBackend {
        inner: MemoryBackend,
        failures: AtomicUsize,
    }

    impl FlakyBackend {
        fn new(failures: usize) -> Self {
            Self {
                inner: MemoryBackend::new(),
                failures: AtomicUsize::new(failures),
            }
        }
    }

    impl KeyValueBackend for FlakyBackend {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(CynefinError::quota_exceeded(key, value.len(), 0));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_put_and_get() {
        let store = store(Arc::new(MemoryBackend::new()), 50);

        let report = store.put("a", result("first"));

        assert_eq!(report.status, BlobWriteStatus::Persisted);
        assert!(report.evicted.is_empty());
        assert_eq!(store.get("a"), Some(result("first")));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_put_evicts_oldest_beyond_cap() {
        let store = store(Arc::new(MemoryBackend::new()), 2);

        store.put("a", result("a"));
        store.put("b", result("b"));
        let report = store.put("c", result("c"));

        assert_eq!(report.evicted, vec!["a".to_string()]);
        assert_eq!(keys(&store.load_all()), vec!["b", "c"]);
    }

    #[test]
    fn test_reput_moves_entry_to_newest() {
        let store = store(Arc::new(MemoryBackend::new()), 2);

        store.put("a", result("a"));
        store.put("b", result("b"));
        store.put("a", result("a2"));
        store.put("c", result("c"));

        let map = store.load_all();
        assert_eq!(keys(&map), vec!["a", "c"]);
        assert_eq!(map["a"], result("a2"));
    }

    #[test]
    fn test_put_merges_with_persisted_state() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let first = store(backend.clone(), 50);
        let second = store(backend, 50);

        first.put("a", result("from first"));
        second.put("b", result("from second"));

        assert_eq!(keys(&first.load_all()), vec!["a", "b"]);
    }

    #[test]
    fn test_rejected_write_retries_with_retry_budget() {
        let backend = Arc::new(FlakyBackend::new(0));
        let store = store(backend.clone(), 4);
        for id in ["a", "b", "c"] {
            store.put(id, result(id));
        }

        backend.failures.store(1, Ordering::SeqCst);
        let report = store.put("d", result("d"));

        // cap 4, budget 2: the retry keeps the newest 2
        assert_eq!(report.status, BlobWriteStatus::PersistedAfterEviction);
        assert_eq!(report.evicted, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(keys(&store.load_all()), vec!["c", "d"]);
    }

    #[test]
    fn test_write_abandoned_when_retry_fails() {
        let backend = Arc::new(FlakyBackend::new(0));
        let store = store(backend.clone(), 4);
        store.put("a", result("a"));

        backend.failures.store(2, Ordering::SeqCst);
        let report = store.put("b", result("b"));

        assert_eq!(report.status, BlobWriteStatus::Abandoned);
        assert!(!report.is_persisted());
        assert!(report.evicted.is_empty());
        assert_eq!(keys(&store.load_all()), vec!["a"]);
    }

    #[test]
    fn test_quota_pressure_keeps_newest_entries() {
        let big = "x".repeat(400);
        let backend = Arc::new(MemoryBackend::with_quota(1500));
        let store = store(backend, 10);

        for id in ["a", "b", "c", "d"] {
            store.put(id, result(&big));
        }

        let map = store.load_all();
        assert!(map.contains_key("d"));
        assert!(map.len() < 4);
    }

    #[test]
    fn test_remove() {
        let store = store(Arc::new(MemoryBackend::new()), 50);
        store.put("a", result("a"));
        store.put("b", result("b"));

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(keys(&store.load_all()), vec!["b"]);
    }

    #[test]
    fn test_retain_drops_orphans() {
        let store = store(Arc::new(MemoryBackend::new()), 50);
        for id in ["a", "b", "c"] {
            store.put(id, result(id));
        }

        let removed = store.retain(|id| id != "b");

        assert_eq!(removed, vec!["b".to_string()]);
        assert_eq!(keys(&store.load_all()), vec!["a", "c"]);
        assert!(store.retain(|_| true).is_empty());
    }

    #[test]
    fn test_corrupt_entries_are_skipped() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(
                "cynefin.history.results",
                r#"{"bad":{"classification":"nope"},
                    "good":{"classification":{"domain":"clear","confidence":1.0}}}"#,
            )
            .unwrap();

        let map = store(backend, 50).load_all();

        assert_eq!(keys(&map), vec!["good"]);
    }

    #[test]
    fn test_corrupt_blob_is_empty() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set("cynefin.history.results", "[1, 2").unwrap();

        assert!(store(backend, 50).load_all().is_empty());
    }
}
