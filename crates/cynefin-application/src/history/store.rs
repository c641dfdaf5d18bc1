use super::cache::ResultCache;
use cynefin_core::KeyValueBackend;
use cynefin_core::error::Result;
use cynefin_core::history::{HistoryConfig, HistoryFilter, index};
use cynefin_core::session::{CynefinDomain, Session, SessionSummary};
use cynefin_infrastructure::{
    BlobWriteReport, ResultBlobStore, StorageAdapter, SummaryIndexStore, WriteOutcome,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// What happened to each tier during a `save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub index: WriteOutcome,
    pub results: BlobWriteReport,
    /// Ids pushed out of the summary index by the cap, oldest last.
    pub evicted: Vec<String>,
}

impl SaveReport {
    /// Both tiers reached the backend.
    pub fn is_fully_persisted(&self) -> bool {
        self.index.is_stored() && self.results.is_persisted()
    }
}

/// Result of `load_full`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The session, joined with its result or a placeholder.
    Found(Session),
    /// No summary with that id is in the index.
    NotFound,
}

impl LoadOutcome {
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::Found(session) => Some(session),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Counts over the current history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub cap: usize,
    pub sessions: usize,
    /// Sessions per domain, in `CynefinDomain::ALL` order.
    pub by_domain: Vec<(CynefinDomain, usize)>,
    /// Results held in memory.
    pub cached_results: usize,
    /// Results in the persisted blob map, including orphans.
    pub persisted_results: usize,
}

/// Bounded two-tier history of analysis sessions.
///
/// The summary index is loaded once at `open` and stays resident. Full
/// results live in the persisted result blob map and are pulled into an
/// in-memory cache only by `save` and `load_full`.
///
/// No operation returns an error once the store is open: backend failures
/// are logged and the store degrades to a smaller or emptier history.
pub struct HistoryStore {
    config: HistoryConfig,
    summaries: Vec<SessionSummary>,
    index_store: SummaryIndexStore,
    results: ResultBlobStore,
    cache: ResultCache,
}

impl HistoryStore {
    /// Opens the history kept in `backend`.
    ///
    /// An index that holds more entries than `config.cap` (for example after
    /// the cap was lowered) is truncated to its newest entries in memory
    /// only. The backend keeps the longer index until the next save or
    /// delete writes it.
    ///
    /// # Errors
    ///
    /// Returns an error only if `config` is invalid or the summary schema
    /// migrator cannot be set up.
    pub fn open(backend: Arc<dyn KeyValueBackend>, config: HistoryConfig) -> Result<Self> {
        config.validate()?;

        let storage = StorageAdapter::new(backend);
        let index_store = SummaryIndexStore::new(storage.clone(), config.index_key.clone())?;
        let results = ResultBlobStore::new(storage, &config);

        let mut summaries = index_store.load();
        if summaries.len() > config.cap {
            tracing::info!(
                "History index holds {} sessions, showing the newest {} (index not rewritten)",
                summaries.len(),
                config.cap
            );
            summaries.truncate(config.cap);
        }

        tracing::debug!("Opened history with {} sessions", summaries.len());

        Ok(Self {
            config,
            summaries,
            index_store,
            results,
            cache: ResultCache::new(),
        })
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// The resident summary index, newest first.
    pub fn summaries(&self) -> &[SessionSummary] {
        &self.summaries
    }

    pub fn get_summary(&self, id: &str) -> Option<&SessionSummary> {
        self.summaries.iter().find(|summary| summary.id == id)
    }

    /// Records a completed session as the newest entry.
    ///
    /// A session whose id is already in the history replaces it. Both tiers
    /// are written even if the first write is rejected. Non-finite numbers
    /// in the result are sanitized first.
    pub fn save(&mut self, session: &Session) -> SaveReport {
        let session = &Session {
            result: session.result.clone().sanitized(),
            ..session.clone()
        };
        let summary = SessionSummary::from_session(session);
        let result_ref = summary.result_ref.clone();

        let next = index::upsert_front(&self.summaries, summary, self.config.cap);
        let evicted = index::dropped_ids(&self.summaries, &next);
        if !evicted.is_empty() {
            tracing::debug!("History cap {} reached, dropping {:?}", self.config.cap, evicted);
        }

        let evicted_refs: Vec<String> = self
            .summaries
            .iter()
            .filter(|old| evicted.contains(&old.id))
            .map(|old| old.result_ref.clone())
            .collect();
        self.summaries = next;

        let index_outcome = self.index_store.persist(&self.summaries);
        if !index_outcome.is_stored() {
            tracing::warn!("History index write rejected while saving '{}'", session.id);
        }

        self.cache.insert(result_ref.clone(), session.result.clone());
        for evicted_ref in &evicted_refs {
            self.cache.remove(evicted_ref);
        }
        let results = self.results.put(&result_ref, session.result.clone());

        SaveReport {
            index: index_outcome,
            results,
            evicted,
        }
    }

    /// Removes a session from both tiers. Unknown ids are a no-op.
    ///
    /// # Returns
    ///
    /// `true` if a summary was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let result_ref = self
            .get_summary(id)
            .map(|summary| summary.result_ref.clone())
            .unwrap_or_else(|| id.to_string());

        let removed = self.summaries.iter().any(|summary| summary.id == id);
        if removed {
            self.summaries = index::remove_by_id(&self.summaries, id);
            if !self.index_store.persist(&self.summaries).is_stored() {
                tracing::warn!("History index write rejected while deleting '{}'", id);
            }
        }

        self.cache.remove(&result_ref);
        self.results.remove(&result_ref);

        if removed {
            tracing::debug!("Deleted session '{}' from history", id);
        }
        removed
    }

    /// Empties both tiers and erases their backend keys.
    pub fn clear(&mut self) {
        let count = self.summaries.len();
        self.summaries.clear();
        self.cache.clear();
        self.index_store.erase();
        self.results.erase();
        tracing::info!("Cleared history ({} sessions)", count);
    }

    /// All sessions, newest first.
    ///
    /// Sessions whose result is cached carry it; the rest are placeholders
    /// built from the summary. The persisted blob map is never read.
    pub fn list(&self) -> Vec<Session> {
        self.summaries.iter().map(|summary| self.join_cached(summary)).collect()
    }

    /// Like `list`, keeping only the sessions `filter` matches.
    pub fn list_filtered(&self, filter: &HistoryFilter) -> Vec<Session> {
        self.summaries
            .iter()
            .filter(|summary| filter.matches(summary))
            .map(|summary| self.join_cached(summary))
            .collect()
    }

    /// Loads one session with its full result.
    ///
    /// A result found in the persisted map is cached. If the summary exists
    /// but its result is gone, the placeholder join is returned.
    pub fn load_full(&mut self, id: &str) -> LoadOutcome {
        let Some(summary) = self.get_summary(id).cloned() else {
            return LoadOutcome::NotFound;
        };

        if let Some(result) = self.cache.get(&summary.result_ref) {
            return LoadOutcome::Found(Session::from_parts(&summary, result.clone()));
        }

        match self.results.get(&summary.result_ref) {
            Some(result) => {
                self.cache.insert(summary.result_ref.clone(), result.clone());
                LoadOutcome::Found(Session::from_parts(&summary, result))
            }
            None => {
                tracing::debug!("No stored result for '{}', returning placeholder", id);
                LoadOutcome::Found(Session::placeholder(&summary))
            }
        }
    }

    /// Every session joined with the best result available, without
    /// touching the cache. Reads the persisted map once.
    pub fn detailed_sessions(&self) -> Vec<Session> {
        let mut persisted = self.results.load_all();
        self.summaries
            .iter()
            .map(|summary| {
                let result = self
                    .cache
                    .get(&summary.result_ref)
                    .cloned()
                    .or_else(|| persisted.shift_remove(&summary.result_ref));
                match result {
                    Some(result) => Session::from_parts(summary, result),
                    None => Session::placeholder(summary),
                }
            })
            .collect()
    }

    /// Drops the cached result of one session. `list` shows it as a
    /// placeholder until the next `load_full`.
    pub fn release(&mut self, id: &str) -> bool {
        let result_ref = self
            .get_summary(id)
            .map(|summary| summary.result_ref.clone())
            .unwrap_or_else(|| id.to_string());
        self.cache.remove(&result_ref)
    }

    /// Drops every cached result.
    pub fn release_all(&mut self) {
        self.cache.clear();
    }

    /// Removes persisted and cached results no summary refers to.
    ///
    /// # Returns
    ///
    /// The removed result refs.
    pub fn compact(&mut self) -> Vec<String> {
        let referenced: HashSet<&str> = self
            .summaries
            .iter()
            .map(|summary| summary.result_ref.as_str())
            .collect();

        let removed = self.results.retain(|result_ref| referenced.contains(result_ref));
        self.cache.retain(|result_ref| referenced.contains(result_ref));

        if !removed.is_empty() {
            tracing::info!("Compacted {} orphaned results", removed.len());
        }
        removed
    }

    pub fn stats(&self) -> HistoryStats {
        let by_domain = CynefinDomain::ALL
            .iter()
            .map(|domain| {
                let count = self
                    .summaries
                    .iter()
                    .filter(|summary| summary.domain == *domain)
                    .count();
                (*domain, count)
            })
            .collect();

        HistoryStats {
            cap: self.config.cap,
            sessions: self.summaries.len(),
            by_domain,
            cached_results: self.cache.len(),
            persisted_results: self.results.load_all().len(),
        }
    }

    /// Whether the result of `id` is held in memory.
    pub fn is_cached(&self, id: &str) -> bool {
        self.get_summary(id)
            .is_some_and(|summary| self.cache.contains(&summary.result_ref))
    }

    fn join_cached(&self, summary: &SessionSummary) -> Session {
        match self.cache.get(&summary.result_ref) {
            Some(result) => Session::from_parts(summary, result.clone()),
            None => Session::placeholder(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cynefin_core::CynefinError;
    use cynefin_core::session::{AnalysisOutcome, CausalResult, FullResult};
    use cynefin_infrastructure::{BlobWriteStatus, MemoryBackend};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session(id: &str, domain: CynefinDomain) -> Session {
        let result = FullResult::new(
            domain,
            0.8,
            AnalysisOutcome::Causal(CausalResult {
                effect: Some(0.4),
                refutations_passed: Some(2),
                refutations_total: Some(2),
                treatment: Some("training".to_string()),
                ..CausalResult::default()
            }),
        )
        .with_narrative(format!("narrative for {}", id));
        Session {
            id: id.to_string(),
            ..Session::new(format!("query {}", id), result)
        }
    }

    fn open(backend: Arc<dyn KeyValueBackend>, cap: usize) -> HistoryStore {
        HistoryStore::open(backend, HistoryConfig::with_cap(cap)).unwrap()
    }

    fn ids(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|session| session.id.as_str()).collect()
    }

    /// Counts reads of the results key.
    struct CountingBackend {
        inner: MemoryBackend,
        result_reads: AtomicUsize,
    }

    impl KeyValueBackend for CountingBackend {
        fn get(&self, key: &str) -> Result<Option<String>> {
            if key.ends_with("results") {
                self.result_reads.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let result = HistoryStore::open(Arc::new(MemoryBackend::new()), HistoryConfig::with_cap(0));

        assert!(matches!(result, Err(CynefinError::Config(_))));
    }

    #[test]
    fn test_save_reports_both_tiers() {
        let mut store = open(Arc::new(MemoryBackend::new()), 50);

        let report = store.save(&session("a", CynefinDomain::Complex));

        assert!(report.is_fully_persisted());
        assert_eq!(report.results.status, BlobWriteStatus::Persisted);
        assert!(report.evicted.is_empty());
        assert_eq!(store.len(), 1);
        assert!(store.is_cached("a"));
    }

    #[test]
    fn test_save_reports_index_eviction() {
        let mut store = open(Arc::new(MemoryBackend::new()), 2);
        store.save(&session("a", CynefinDomain::Clear));
        store.save(&session("b", CynefinDomain::Clear));

        let report = store.save(&session("c", CynefinDomain::Clear));

        assert_eq!(report.evicted, vec!["a".to_string()]);
        assert!(!store.is_cached("a"));
        assert_eq!(store.load_full("a"), LoadOutcome::NotFound);
    }

    #[test]
    fn test_list_never_reads_result_map() {
        let backend = Arc::new(CountingBackend {
            inner: MemoryBackend::new(),
            result_reads: AtomicUsize::new(0),
        });
        let mut store = open(backend.clone(), 50);
        store.save(&session("a", CynefinDomain::Complex));
        store.save(&session("b", CynefinDomain::Chaotic));
        store.release_all();
        let reads_before = backend.result_reads.load(Ordering::SeqCst);

        let listed = store.list();

        assert_eq!(ids(&listed), vec!["b", "a"]);
        assert!(listed.iter().all(Session::is_placeholder));
        assert_eq!(backend.result_reads.load(Ordering::SeqCst), reads_before);
    }

    #[test]
    fn test_list_joins_cached_results() {
        let mut store = open(Arc::new(MemoryBackend::new()), 50);
        let original = session("a", CynefinDomain::Complicated);
        store.save(&original);

        let listed = store.list();

        assert_eq!(listed, vec![original]);
    }

    #[test]
    fn test_load_full_populates_cache() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let original = session("a", CynefinDomain::Complex);
        open(backend.clone(), 50).save(&original);

        let mut reopened = open(backend, 50);
        assert!(!reopened.is_cached("a"));

        let loaded = reopened.load_full("a").into_session().unwrap();

        assert_eq!(loaded, original);
        assert!(reopened.is_cached("a"));
        assert_eq!(reopened.list(), vec![original]);
    }

    #[test]
    fn test_load_full_unknown_id() {
        let mut store = open(Arc::new(MemoryBackend::new()), 50);

        assert_eq!(store.load_full("missing"), LoadOutcome::NotFound);
    }

    #[test]
    fn test_load_full_missing_result_is_placeholder() {
        let backend = Arc::new(MemoryBackend::new());
        let mut store = open(backend.clone(), 50);
        store.save(&session("a", CynefinDomain::Complex));
        backend.remove("cynefin.history.results").unwrap();
        store.release("a");

        let loaded = store.load_full("a").into_session().unwrap();

        assert!(loaded.is_placeholder());
        assert_eq!(loaded.result.causal().and_then(|causal| causal.effect), Some(0.4));
        assert!(!store.is_cached("a"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = open(Arc::new(MemoryBackend::new()), 50);
        store.save(&session("a", CynefinDomain::Clear));
        store.save(&session("b", CynefinDomain::Clear));

        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(!store.delete("never-saved"));

        assert_eq!(ids(&store.list()), vec!["b"]);
        assert_eq!(store.load_full("a"), LoadOutcome::NotFound);
    }

    #[test]
    fn test_clear_erases_backend_keys() {
        let backend = Arc::new(MemoryBackend::new());
        let mut store = open(backend.clone(), 50);
        store.save(&session("a", CynefinDomain::Clear));

        store.clear();

        assert!(store.is_empty());
        assert!(!backend.contains_key("cynefin.history.index"));
        assert!(!backend.contains_key("cynefin.history.results"));
        assert_eq!(store.load_full("a"), LoadOutcome::NotFound);
    }

    #[test]
    fn test_open_with_lower_cap_leaves_backend_index_alone() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let mut wide = open(backend.clone(), 5);
        for id in ["a", "b", "c", "d"] {
            wide.save(&session(id, CynefinDomain::Clear));
        }

        let narrow = open(backend.clone(), 2);
        assert_eq!(ids(&narrow.list()), vec!["d", "c"]);
        assert_eq!(narrow.len(), 2);
        drop(narrow);

        let reopened = open(backend, 5);
        assert_eq!(ids(&reopened.list()), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn test_lower_cap_is_persisted_by_next_save() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let mut wide = open(backend.clone(), 5);
        for id in ["a", "b", "c", "d"] {
            wide.save(&session(id, CynefinDomain::Clear));
        }

        let mut narrow = open(backend.clone(), 2);
        narrow.save(&session("e", CynefinDomain::Clear));

        let reopened = open(backend, 5);
        assert_eq!(ids(&reopened.list()), vec!["e", "d"]);
    }

    #[test]
    fn test_non_finite_result_survives_reopen() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let mut result = FullResult::new(
            CynefinDomain::Complicated,
            0.5,
            AnalysisOutcome::Causal(CausalResult {
                effect: Some(0.2),
                confidence_interval: Some((0.1, 0.3)),
                ..CausalResult::default()
            }),
        );
        result.classification.confidence = f64::NAN;
        if let AnalysisOutcome::Causal(causal) = &mut result.outcome {
            causal.confidence_interval = Some((f64::NEG_INFINITY, 0.3));
        }
        let original = Session {
            id: "nan".to_string(),
            ..Session::new("query nan", result)
        };

        let mut store = open(backend.clone(), 5);
        assert!(store.save(&original).is_fully_persisted());

        let mut reopened = open(backend, 5);
        let loaded = reopened.load_full("nan").into_session().unwrap();
        assert!(!loaded.is_placeholder());
        assert_eq!(loaded.result.classification.confidence, 0.0);
        let causal = loaded.result.causal().unwrap();
        assert_eq!(causal.effect, Some(0.2));
        assert_eq!(causal.confidence_interval, None);
    }

    #[test]
    fn test_list_filtered() {
        let mut store = open(Arc::new(MemoryBackend::new()), 50);
        store.save(&session("a", CynefinDomain::Clear));
        store.save(&session("b", CynefinDomain::Complex));

        let filtered = store.list_filtered(&HistoryFilter::default().domain(CynefinDomain::Complex));

        assert_eq!(ids(&filtered), vec!["b"]);
    }

    #[test]
    fn test_compact_removes_orphans() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let mut store = open(backend.clone(), 50);
        store.save(&session("a", CynefinDomain::Clear));
        store.save(&session("b", CynefinDomain::Clear));

        // An orphan written by a process that crashed before its index write.
        let orphan_writer = ResultBlobStore::new(
            StorageAdapter::new(backend),
            &HistoryConfig::default(),
        );
        orphan_writer.put("orphan", session("orphan", CynefinDomain::Chaotic).result);

        assert_eq!(store.stats().persisted_results, 3);
        assert_eq!(store.compact(), vec!["orphan".to_string()]);
        assert_eq!(store.stats().persisted_results, 2);
        assert!(store.compact().is_empty());
    }

    #[test]
    fn test_stats() {
        let mut store = open(Arc::new(MemoryBackend::new()), 10);
        store.save(&session("a", CynefinDomain::Clear));
        store.save(&session("b", CynefinDomain::Clear));
        store.save(&session("c", CynefinDomain::Chaotic));
        store.release("c");

        let stats = store.stats();

        assert_eq!(stats.cap, 10);
        assert_eq!(stats.sessions, 3);
        assert_eq!(stats.cached_results, 2);
        assert_eq!(stats.persisted_results, 3);
        assert!(stats.by_domain.contains(&(CynefinDomain::Clear, 2)));
        assert!(stats.by_domain.contains(&(CynefinDomain::Chaotic, 1)));
        assert!(stats.by_domain.contains(&(CynefinDomain::Disorder, 0)));
    }

    #[test]
    fn test_detailed_sessions_leave_cache_alone() {
        let backend: Arc<dyn KeyValueBackend> = Arc::new(MemoryBackend::new());
        let original = session("a", CynefinDomain::Complex);
        open(backend.clone(), 50).save(&original);
        let reopened = open(backend, 50);

        let detailed = reopened.detailed_sessions();

        assert_eq!(detailed, vec![original]);
        assert!(!reopened.is_cached("a"));
    }
}
