//! Cache metrics system.
//!
//! Provides BTreeMap-based metrics reporting for both cache variants. Each
//! variant tracks its own specific counters while implementing a common
//! [`CacheMetrics`] trait.
//!
//! # Why BTreeMap over HashMap?
//!
//! BTreeMap is used instead of HashMap for several reasons:
//! - **Deterministic ordering**: metrics always appear in consistent order
//! - **Reproducible output**: essential for comparing simulation runs
//! - **Stable serialization**: exports have predictable key ordering
//!
//! The performance difference is negligible with this many keys, and the
//! deterministic behavior is invaluable for a simulation system.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

/// Common interface for reporting cache metrics.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Returns the algorithm name for this cache implementation.
    fn algorithm_name(&self) -> &'static str;
}

/// Counters common to both cache variants.
#[derive(Debug, Default, Clone)]
pub struct CoreCacheMetrics {
    /// Total number of accesses made to the cache.
    pub requests: u64,
    /// Number of accesses that found the key cached.
    pub cache_hits: u64,
    /// Number of entries inserted into the cache.
    pub insertions: u64,
    /// Number of entries evicted under capacity pressure.
    pub evictions: u64,
    /// Number of entries purged by explicit removal.
    pub removals: u64,
}

impl CoreCacheMetrics {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        CoreCacheMetrics::default()
    }

    /// Records an access that found the key cached.
    pub fn record_hit(&mut self) {
        self.requests += 1;
        self.cache_hits += 1;
    }

    /// Records an access that missed.
    ///
    /// Misses are derived as `requests - cache_hits` when reporting.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records an insertion of a fresh entry.
    pub fn record_insertion(&mut self) {
        self.insertions += 1;
    }

    /// Records an eviction under capacity pressure.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Records an explicit removal.
    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    /// Converts the core counters to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("requests".to_string(), self.requests as f64);
        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            (self.requests - self.cache_hits) as f64,
        );
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("removals".to_string(), self.removals as f64);
        let hit_rate = if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        };
        metrics.insert("hit_rate".to_string(), hit_rate);
        metrics
    }
}

/// Metrics for the base memoizing cache.
///
/// The memo cache uses only the core counters, but the structure is kept for
/// consistency with the page variant.
#[derive(Debug, Default, Clone)]
pub struct MemoCacheMetrics {
    /// Core counters.
    pub core: CoreCacheMetrics,
}

impl MemoCacheMetrics {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        MemoCacheMetrics::default()
    }
}

impl CacheMetrics for MemoCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.core.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "MEMO-LRU"
    }
}

/// Metrics for the page-aware dirty-tracking cache.
#[derive(Debug, Default, Clone)]
pub struct PageCacheMetrics {
    /// Core counters.
    pub core: CoreCacheMetrics,
    /// Number of accesses that stamped the `DIRTY` bit.
    pub dirty_marks: u64,
    /// Number of flush-boundary sweeps performed.
    pub flush_sweeps: u64,
    /// Number of pages whose `DIRTY` bit a sweep cleared.
    pub pages_cleaned: u64,
    /// Number of eviction trace records emitted.
    pub trace_records: u64,
}

impl PageCacheMetrics {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        PageCacheMetrics::default()
    }
}

impl CacheMetrics for PageCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();
        metrics.insert("dirty_marks".to_string(), self.dirty_marks as f64);
        metrics.insert("flush_sweeps".to_string(), self.flush_sweeps as f64);
        metrics.insert("pages_cleaned".to_string(), self.pages_cleaned as f64);
        metrics.insert("trace_records".to_string(), self.trace_records as f64);
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "PAGE-LRU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_counters_and_derived_misses() {
        let mut core = CoreCacheMetrics::new();
        core.record_miss();
        core.record_miss();
        core.record_hit();
        core.record_insertion();
        core.record_eviction();

        let m = core.to_btreemap();
        assert_eq!(m["requests"], 3.0);
        assert_eq!(m["cache_hits"], 1.0);
        assert_eq!(m["cache_misses"], 2.0);
        assert_eq!(m["insertions"], 1.0);
        assert_eq!(m["evictions"], 1.0);
        assert!((m["hit_rate"] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hit_rate_is_zero_without_requests() {
        let core = CoreCacheMetrics::new();
        assert_eq!(core.to_btreemap()["hit_rate"], 0.0);
    }

    #[test]
    fn test_page_metrics_extend_core() {
        let mut metrics = PageCacheMetrics::new();
        metrics.core.record_hit();
        metrics.flush_sweeps = 2;
        metrics.pages_cleaned = 5;
        metrics.trace_records = 1;

        let m = metrics.metrics();
        assert_eq!(m["flush_sweeps"], 2.0);
        assert_eq!(m["pages_cleaned"], 5.0);
        assert_eq!(m["trace_records"], 1.0);
        assert_eq!(m["cache_hits"], 1.0);
        assert_eq!(metrics.algorithm_name(), "PAGE-LRU");
    }

    #[test]
    fn test_memo_metrics_algorithm_name() {
        assert_eq!(MemoCacheMetrics::new().algorithm_name(), "MEMO-LRU");
    }
}
