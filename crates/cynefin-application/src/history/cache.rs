use cynefin_core::session::FullResult;
use std::collections::HashMap;

/// In-memory cache of full results, keyed by result ref.
///
/// This cache holds the results this process has saved or loaded, so
/// repeated detail views don't re-read and re-parse the result blob map.
/// It is also the only surviving copy of a result whose backend write was
/// abandoned.
#[derive(Debug, Default)]
pub struct ResultCache {
    results: HashMap<String, FullResult>,
}

impl ResultCache {
    /// Creates a new empty ResultCache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a cached result by ref.
    pub fn get(&self, result_ref: &str) -> Option<&FullResult> {
        self.results.get(result_ref)
    }

    pub fn contains(&self, result_ref: &str) -> bool {
        self.results.contains_key(result_ref)
    }

    /// Inserts a result into the cache, replacing any previous one.
    pub fn insert(&mut self, result_ref: String, result: FullResult) {
        self.results.insert(result_ref, result);
    }

    /// Removes a result from the cache.
    ///
    /// # Returns
    ///
    /// `true` if the result was cached.
    pub fn remove(&mut self, result_ref: &str) -> bool {
        self.results.remove(result_ref).is_some()
    }

    /// Keeps only the results whose ref satisfies `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.results.retain(|result_ref, _| keep(result_ref));
    }

    /// Clears all cached results.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cynefin_core::session::{AnalysisOutcome, CynefinDomain};

    fn result() -> FullResult {
        FullResult::new(CynefinDomain::Clear, 1.0, AnalysisOutcome::Absent)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut cache = ResultCache::new();
        cache.insert("a".to_string(), result());

        assert!(cache.contains("a"));
        assert_eq!(cache.get("a"), Some(&result()));
        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_retain() {
        let mut cache = ResultCache::new();
        for id in ["a", "b", "c"] {
            cache.insert(id.to_string(), result());
        }

        cache.retain(|id| id != "b");

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("b"));
    }
}
