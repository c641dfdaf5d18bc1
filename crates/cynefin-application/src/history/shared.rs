use super::store::{HistoryStats, HistoryStore, LoadOutcome, SaveReport};
use crate::export::{HistorySnapshot, ImportReport};
use cynefin_core::KeyValueBackend;
use cynefin_core::error::Result;
use cynefin_core::history::{HistoryConfig, HistoryFilter};
use cynefin_core::session::Session;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cloneable handle to one `HistoryStore` for async hosts.
///
/// Read-only views take the read lock. Everything that may touch the
/// result cache (including `load_full`) takes the write lock.
#[derive(Clone)]
pub struct SharedHistoryStore {
    inner: Arc<RwLock<HistoryStore>>,
}

impl SharedHistoryStore {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Opens a store over `backend` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn open(backend: Arc<dyn KeyValueBackend>, config: HistoryConfig) -> Result<Self> {
        Ok(Self::new(HistoryStore::open(backend, config)?))
    }

    pub async fn save(&self, session: &Session) -> SaveReport {
        self.inner.write().await.save(session)
    }

    pub async fn delete(&self, id: &str) -> bool {
        self.inner.write().await.delete(id)
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn list(&self) -> Vec<Session> {
        self.inner.read().await.list()
    }

    pub async fn list_filtered(&self, filter: &HistoryFilter) -> Vec<Session> {
        self.inner.read().await.list_filtered(filter)
    }

    pub async fn load_full(&self, id: &str) -> LoadOutcome {
        self.inner.write().await.load_full(id)
    }

    pub async fn release(&self, id: &str) -> bool {
        self.inner.write().await.release(id)
    }

    pub async fn release_all(&self) {
        self.inner.write().await.release_all();
    }

    pub async fn compact(&self) -> Vec<String> {
        self.inner.write().await.compact()
    }

    pub async fn stats(&self) -> HistoryStats {
        self.inner.read().await.stats()
    }

    pub async fn export(&self) -> HistorySnapshot {
        HistorySnapshot::capture(&*self.inner.read().await)
    }

    pub async fn import(&self, snapshot: &HistorySnapshot) -> ImportReport {
        self.inner.write().await.import(snapshot)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
