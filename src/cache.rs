//! Per-config caches for compilation byproducts.
//!
//! # Responsibilities
//! - Remember the source map from the last successful compilation per id
//! - Remember the exported externs from the last successful compilation per id
//! - Serve concurrent reads and writes from all request workers
//!
//! # Design Decisions
//! - Two independent maps: a config may have externs recorded but no source
//!   map consumer, and vice versa
//! - Entries are only written after a compilation succeeds; failures leave
//!   the previous entry in place
//! - No eviction: the id set is fixed at startup, so growth is bounded by
//!   the number of registered configs

use dashmap::DashMap;
use std::sync::Arc;

use crate::observability::metrics;

/// A thread-safe cache of the latest compilation byproducts, keyed by
/// config id.
#[derive(Clone, Default)]
pub struct ResultCache {
    source_maps: Arc<DashMap<String, String>>,
    externs: Arc<DashMap<String, String>>,
}

impl ResultCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            source_maps: Arc::new(DashMap::new()),
            externs: Arc::new(DashMap::new()),
        }
    }

    /// Record the source map from the last compilation for the id.
    pub fn record_source_map(&self, id: &str, source_map: String) {
        self.source_maps.insert(id.to_string(), source_map);
        metrics::record_cache_size(self.source_maps.len() + self.externs.len());
    }

    /// The last recorded source map for the id, if any compilation has
    /// succeeded yet.
    pub fn source_map(&self, id: &str) -> Option<String> {
        self.source_maps.get(id).map(|r| r.value().clone())
    }

    /// Record the exported externs from the last compilation for the id.
    pub fn record_externs(&self, id: &str, externs: String) {
        self.externs.insert(id.to_string(), externs);
        metrics::record_cache_size(self.source_maps.len() + self.externs.len());
    }

    /// The last recorded externs text for the id, if any compilation has
    /// succeeded yet.
    pub fn externs(&self, id: &str) -> Option<String> {
        self.externs.get(id).map(|r| r.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_cache_is_absent() {
        let cache = ResultCache::new();
        assert!(cache.source_map("app").is_none());
        assert!(cache.externs("app").is_none());
    }

    #[test]
    fn test_record_and_read_back() {
        let cache = ResultCache::new();
        cache.record_source_map("app", "{\"version\":3}".to_string());
        cache.record_externs("app", "var app = {};".to_string());

        assert_eq!(cache.source_map("app").unwrap(), "{\"version\":3}");
        assert_eq!(cache.externs("app").unwrap(), "var app = {};");

        // Other ids stay cold.
        assert!(cache.source_map("lib").is_none());
    }

    #[test]
    fn test_overwrite_replaces_whole_slot() {
        let cache = ResultCache::new();
        cache.record_source_map("app", "old".to_string());
        cache.record_source_map("app", "new".to_string());
        assert_eq!(cache.source_map("app").unwrap(), "new");
    }
}
