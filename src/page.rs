//! Page-aware dirty-tracking LRU cache.
//!
//! [`PageCache`] models a buffer cache sitting in front of simulated backing
//! storage. It layers a write/flush protocol on top of the shared LRU
//! engine:
//!
//! - a write access stamps the `DIRTY` bit into both the returned status and
//!   the accessed value's flag field, before hit/miss classification;
//! - the first access whose issue time reaches a multiple of the flush
//!   interval sweeps the whole cache in recency order and clears `DIRTY` on
//!   every entry, modeling a bulk flush to backing storage (no eviction, no
//!   trace emission);
//! - *every* access computes and inserts a fresh entry. A hit first erases
//!   the stale entry, then inserts the freshly computed value as
//!   most-recently-used — a page re-fetch with fresh metadata, not a mere
//!   recency refresh;
//! - each eviction (capacity pressure or explicit removal) emits one
//!   [`EvictionRecord`](crate::trace::EvictionRecord) to the configured
//!   [`TraceSink`], timestamped with the *triggering access's* issue time and
//!   carrying the *victim's* block number and request size.
//!
//! # Examples
//!
//! ```
//! use memo_cache::config::PageCacheConfig;
//! use memo_cache::trace::VecSink;
//! use memo_cache::{PageCache, PageRequest, Status};
//! use core::num::NonZeroUsize;
//!
//! let config = PageCacheConfig::new(NonZeroUsize::new(2).unwrap());
//! let mut cache = PageCache::init(
//!     config,
//!     |_key: &u64, aux: &PageRequest| aux.clone(),
//!     VecSink::new(),
//! );
//!
//! let mut req = PageRequest::new(0.5, 1024, 8);
//! let status = cache.access(1024, &mut req, Status::WRITE);
//! assert!(status.contains(Status::PAGEMISS));
//! assert!(status.contains(Status::DIRTY));
//! ```

extern crate alloc;

use crate::config::PageCacheConfig;
use crate::engine::{AccessPolicy, CacheCore, CacheEngine};
use crate::flags::Status;
use crate::list::RecencyIter;
use crate::metrics::{CacheMetrics, CoreCacheMetrics, PageCacheMetrics};
use crate::trace::{EvictionRecord, TraceSink};
use crate::value::PageValue;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;
use core::num::NonZeroUsize;

/// Dirty-tracking policy: insert on every access, recompute on hit, flush on
/// interval boundaries, trace every eviction.
pub struct PagePolicy<S> {
    sink: S,
    flush_interval: f64,
    /// Index of the last flush window a sweep has been performed for.
    flush_epoch: u64,
    dirty_marks: u64,
    flush_sweeps: u64,
    pages_cleaned: u64,
    trace_records: u64,
}

impl<S> PagePolicy<S> {
    /// Creates the policy around a trace sink.
    pub fn new(flush_interval: f64, sink: S) -> Self {
        PagePolicy {
            sink,
            flush_interval,
            flush_epoch: 0,
            dirty_marks: 0,
            flush_sweeps: 0,
            pages_cleaned: 0,
            trace_records: 0,
        }
    }

    /// The configured trace sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the trace sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the policy and returns its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: TraceSink> PagePolicy<S> {
    fn emit<V: PageValue>(&mut self, victim: &V, issue_time: f64) {
        let record = EvictionRecord {
            issue_time,
            block_number: victim.block_number(),
            request_size: victim.request_size(),
        };
        self.sink.record(&record);
        self.trace_records += 1;
    }
}

impl<K, V, S> AccessPolicy<K, V> for PagePolicy<S>
where
    K: Ord + Clone,
    V: PageValue,
    S: TraceSink,
{
    fn before_access(&mut self, core: &mut CacheCore<K, V>, aux: &mut V, status: Status) -> Status {
        // Flush boundary: the first access whose issue time reaches a new
        // multiple of the interval cleans every dirty page in one sweep.
        let epoch = (aux.issue_time() / self.flush_interval) as u64;
        if epoch > self.flush_epoch {
            self.flush_epoch = epoch;
            self.flush_sweeps += 1;
            let mut cleaned = 0u64;
            core.for_each_lru(|_key, value| {
                let mut flags = value.flags();
                if flags.contains(Status::DIRTY) {
                    flags.remove(Status::DIRTY);
                    value.set_flags(flags);
                    cleaned += 1;
                }
            });
            self.pages_cleaned += cleaned;
        }

        // Writes dirty the page before the hit/miss branch is evaluated.
        let mut status = status;
        if status.contains(Status::WRITE) {
            status |= Status::DIRTY;
            aux.set_flags(status);
            self.dirty_marks += 1;
        }
        status
    }

    fn admit_on_miss(&self, _status: Status) -> bool {
        true
    }

    fn replace_on_hit(&self) -> bool {
        true
    }

    fn hit_flags(&self) -> Status {
        Status::PAGEHIT | Status::BLKHIT
    }

    fn miss_flags(&self) -> Status {
        Status::PAGEMISS
    }

    fn on_evict(&mut self, _key: &K, victim: &V, aux: &V) {
        self.emit(victim, aux.issue_time());
    }

    fn on_remove(&mut self, _key: &K, victim: &V, aux: Option<&V>) {
        // The eviction is logged at the triggering access's issue time; an
        // un-attributed removal falls back to the victim's own time.
        let issue_time = aux.map_or_else(|| victim.issue_time(), PageValue::issue_time);
        self.emit(victim, issue_time);
    }
}

impl<S> fmt::Debug for PagePolicy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagePolicy")
            .field("flush_interval", &self.flush_interval)
            .field("flush_epoch", &self.flush_epoch)
            .field("trace_records", &self.trace_records)
            .finish_non_exhaustive()
    }
}

/// Fixed-capacity page cache with dirty tracking, periodic flush sweeps, and
/// eviction tracing.
///
/// See the [module docs](self) for the full protocol. `V` must expose the
/// [`PageValue`] capability surface (request metadata plus a mutable flag
/// field).
pub struct PageCache<K, V, F, S> {
    engine: CacheEngine<K, V, F, PagePolicy<S>>,
}

impl<K, V, F, S> PageCache<K, V, F, S>
where
    K: Ord + Clone,
    V: PageValue,
    F: FnMut(&K, &V) -> V,
    S: TraceSink,
{
    /// Creates a cache from its configuration, compute function, and trace
    /// sink.
    pub fn init(config: PageCacheConfig, compute: F, sink: S) -> Self {
        PageCache {
            engine: CacheEngine::new(
                config.capacity,
                compute,
                PagePolicy::new(config.flush_interval, sink),
            ),
        }
    }

    /// Performs one access for `key`.
    ///
    /// Runs the flush-boundary check and dirty marking first, then computes
    /// a fresh value and inserts it: on a miss the result is cached
    /// unconditionally (evicting the strict LRU entry when full, `EVICT`
    /// merged into the status); on a hit the old entry is erased and the
    /// fresh value inserted as most-recently-used. Returns `status |
    /// PAGEMISS` or `status | PAGEHIT | BLKHIT`, with `DIRTY` merged in for
    /// writes.
    pub fn access(&mut self, key: K, aux: &mut V, status: Status) -> Status {
        self.engine.access(key, aux, status)
    }

    /// Explicitly evicts `key`, emitting one trace record attributed to the
    /// access carrying `aux` before the entry is purged.
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty or `key` is not cached.
    pub fn remove(&mut self, key: &K, aux: &V) {
        self.engine.remove_with(key, aux);
    }
}

impl<K: Ord + Clone, V, F, S> PageCache<K, V, F, S> {
    /// The smallest cached key by key order (not recency order).
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty.
    pub fn min_key(&self) -> &K {
        self.engine.min_key()
    }

    /// The largest cached key by key order (not recency order).
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty.
    pub fn max_key(&self) -> &K {
        self.engine.max_key()
    }

    /// Number of cached pages.
    #[inline]
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    /// Returns true if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    /// The fixed capacity set at construction.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.engine.capacity()
    }

    /// Returns true if `key` is currently cached.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.engine.contains(key)
    }

    /// Returns the cached value for `key` without refreshing its recency.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.engine.peek(key)
    }

    /// Iterates over cached keys from least- to most-recently-used.
    pub fn iter_lru(&self) -> RecencyIter<'_, K> {
        self.engine.iter_lru()
    }

    /// The configured trace sink.
    pub fn sink(&self) -> &S {
        self.engine.policy().sink()
    }

    /// Consumes the cache and returns its trace sink.
    pub fn into_sink(self) -> S {
        self.engine.into_policy().into_sink()
    }

    /// Core counters maintained by the cache.
    pub fn core_metrics(&self) -> &CoreCacheMetrics {
        self.engine.metrics()
    }
}

impl<K: Ord + Clone, V, F, S> CacheMetrics for PageCache<K, V, F, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let policy = self.engine.policy();
        PageCacheMetrics {
            core: self.engine.metrics().clone(),
            dirty_marks: policy.dirty_marks,
            flush_sweeps: policy.flush_sweeps,
            pages_cleaned: policy.pages_cleaned,
            trace_records: policy.trace_records,
        }
        .metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        "PAGE-LRU"
    }
}

impl<K: fmt::Debug + Ord, V, F, S> fmt::Debug for PageCache<K, V, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCache")
            .field("engine", &self.engine)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::VecSink;
    use crate::value::PageRequest;
    use alloc::vec::Vec;

    type TestCache = PageCache<u64, PageRequest, fn(&u64, &PageRequest) -> PageRequest, VecSink>;

    fn refetch(_key: &u64, aux: &PageRequest) -> PageRequest {
        aux.clone()
    }

    fn make_cache(cap: usize) -> TestCache {
        let config = PageCacheConfig::new(NonZeroUsize::new(cap).unwrap());
        PageCache::init(config, refetch, VecSink::new())
    }

    fn req(issue_time: f64, block: u64, size: u64) -> PageRequest {
        PageRequest::new(issue_time, block, size)
    }

    fn lru_order(cache: &TestCache) -> Vec<u64> {
        cache.iter_lru().copied().collect()
    }

    fn flags_of(cache: &TestCache, key: u64) -> Status {
        cache.peek(&key).unwrap().flags()
    }

    #[test]
    fn test_miss_inserts_regardless_of_write() {
        let mut cache = make_cache(2);
        let mut read = req(0.1, 100, 8);
        let status = cache.access(100, &mut read, Status::empty());
        assert_eq!(status, Status::PAGEMISS);
        assert_eq!(cache.len(), 1);
        assert!(!flags_of(&cache, 100).contains(Status::DIRTY));
    }

    #[test]
    fn test_write_marks_dirty_in_status_and_value() {
        let mut cache = make_cache(2);
        let mut write = req(0.2, 100, 8);
        let status = cache.access(100, &mut write, Status::WRITE);
        assert!(status.contains(Status::PAGEMISS));
        assert!(status.contains(Status::DIRTY));
        assert!(status.contains(Status::WRITE));
        // The dirty flag is recorded on the cached page itself.
        assert!(flags_of(&cache, 100).contains(Status::DIRTY));
    }

    #[test]
    fn test_hit_replaces_entry_with_fresh_metadata() {
        let mut cache = make_cache(2);
        cache.access(100, &mut req(0.1, 100, 8), Status::empty());
        cache.access(200, &mut req(0.2, 200, 8), Status::empty());

        let mut refreshed = req(5.0, 100, 16);
        let status = cache.access(100, &mut refreshed, Status::empty());
        assert_eq!(status, Status::PAGEHIT | Status::BLKHIT);
        // Size unchanged, entry rebuilt from the new access, now MRU.
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek(&100).unwrap().issue_time, 5.0);
        assert_eq!(cache.peek(&100).unwrap().request_size, 16);
        assert_eq!(lru_order(&cache), [200, 100]);
    }

    #[test]
    fn test_eviction_emits_trace_with_trigger_time_and_victim_metadata() {
        let mut cache = make_cache(2);
        cache.access(100, &mut req(1.0, 100, 8), Status::WRITE);
        cache.access(200, &mut req(2.0, 200, 16), Status::WRITE);

        // Third page evicts block 100; the record carries the *new* access's
        // issue time and the *victim's* block/size.
        let status = cache.access(300, &mut req(3.5, 300, 4), Status::WRITE);
        assert!(status.contains(Status::EVICT));

        let lines = cache.sink().lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][0..16], "3.500000        ");
        assert_eq!(&lines[0][16..24], "0       ");
        assert_eq!(&lines[0][24..32], "100     ");
        assert_eq!(&lines[0][32..40], "8       ");
        assert_eq!(&lines[0][40..], "0");
    }

    #[test]
    fn test_eviction_victim_is_strict_lru() {
        let mut cache = make_cache(3);
        for (i, blk) in [10u64, 20, 30].iter().enumerate() {
            cache.access(*blk, &mut req(i as f64, *blk, 8), Status::WRITE);
        }
        // A hit on 10 reinserts it as MRU; 20 becomes the victim.
        cache.access(10, &mut req(3.0, 10, 8), Status::empty());
        cache.access(40, &mut req(4.0, 40, 8), Status::WRITE);
        assert!(!cache.contains(&20));
        assert_eq!(lru_order(&cache), [30, 10, 40]);
        assert!(cache.sink().lines()[0].contains("20      "));
    }

    #[test]
    fn test_flush_sweep_cleans_all_dirty_and_evicts_none() {
        let mut cache = make_cache(4);
        cache.access(1, &mut req(1.0, 1, 8), Status::WRITE);
        cache.access(2, &mut req(2.0, 2, 8), Status::WRITE);
        cache.access(3, &mut req(3.0, 3, 8), Status::empty());
        assert!(flags_of(&cache, 1).contains(Status::DIRTY));
        assert!(flags_of(&cache, 2).contains(Status::DIRTY));

        // First access past the 30-unit boundary triggers the sweep; the
        // access itself is a clean read of a fourth page.
        let status = cache.access(4, &mut req(31.0, 4, 8), Status::empty());
        assert_eq!(status, Status::PAGEMISS);
        assert_eq!(cache.len(), 4);
        for key in [1, 2, 3, 4] {
            assert!(!flags_of(&cache, key).contains(Status::DIRTY));
        }
        // A flush is not an eviction: no trace records.
        assert!(cache.sink().lines().is_empty());
    }

    #[test]
    fn test_flush_runs_once_per_boundary() {
        let mut cache = make_cache(4);
        cache.access(1, &mut req(1.0, 1, 8), Status::WRITE);

        // Crossing into the second window flushes once.
        cache.access(2, &mut req(30.0, 2, 8), Status::empty());
        // A dirty write inside the same window stays dirty.
        cache.access(3, &mut req(35.0, 3, 8), Status::WRITE);
        cache.access(4, &mut req(40.0, 4, 8), Status::empty());
        assert!(flags_of(&cache, 3).contains(Status::DIRTY));

        // Next window cleans it.
        cache.access(2, &mut req(60.0, 2, 8), Status::empty());
        assert!(!flags_of(&cache, 3).contains(Status::DIRTY));

        let metrics = crate::metrics::CacheMetrics::metrics(&cache);
        assert_eq!(metrics["flush_sweeps"], 2.0);
        assert_eq!(metrics["pages_cleaned"], 2.0);
    }

    #[test]
    fn test_dirty_persists_until_flush_or_eviction() {
        let mut cache = make_cache(2);
        cache.access(1, &mut req(1.0, 1, 8), Status::WRITE);
        // Unrelated accesses inside the window do not clean it.
        cache.access(2, &mut req(2.0, 2, 8), Status::empty());
        assert!(flags_of(&cache, 1).contains(Status::DIRTY));

        // Eviction is terminal for the dirty page and logs exactly one line.
        cache.access(3, &mut req(3.0, 3, 8), Status::empty());
        assert!(!cache.contains(&1));
        assert_eq!(cache.sink().lines().len(), 1);
    }

    #[test]
    fn test_hit_reinsert_never_changes_size() {
        let mut cache = make_cache(2);
        cache.access(1, &mut req(1.0, 1, 8), Status::WRITE);
        cache.access(2, &mut req(2.0, 2, 8), Status::WRITE);
        for t in 3..10 {
            cache.access(1, &mut req(t as f64, 1, 8), Status::WRITE);
            assert_eq!(cache.len(), 2);
        }
        // Hits never evict, so no trace output either.
        assert!(cache.sink().lines().is_empty());
    }

    #[test]
    fn test_remove_emits_trace_for_victim() {
        let mut cache = make_cache(2);
        cache.access(7, &mut req(1.0, 7, 8), Status::WRITE);
        let trigger = req(9.0, 999, 4);
        cache.remove(&7, &trigger);
        assert!(cache.is_empty());

        let lines = cache.sink().lines();
        assert_eq!(lines.len(), 1);
        // Trigger's time, victim's block and size.
        assert!(lines[0].starts_with("9.000000        "));
        assert!(lines[0].contains("7       "));
    }

    #[test]
    #[should_panic(expected = "not cached")]
    fn test_remove_of_absent_key_is_fatal() {
        let mut cache = make_cache(2);
        cache.access(1, &mut req(1.0, 1, 8), Status::WRITE);
        cache.remove(&2, &req(2.0, 2, 8));
    }

    #[test]
    fn test_min_max_key_by_key_order() {
        let mut cache = make_cache(3);
        for key in [5u64, 9, 2] {
            cache.access(key, &mut req(1.0, key, 8), Status::empty());
        }
        assert_eq!(*cache.min_key(), 2);
        assert_eq!(*cache.max_key(), 9);
    }

    #[test]
    fn test_metrics_counters() {
        let mut cache = make_cache(2);
        cache.access(1, &mut req(1.0, 1, 8), Status::WRITE);
        cache.access(1, &mut req(2.0, 1, 8), Status::empty());
        cache.access(2, &mut req(3.0, 2, 8), Status::WRITE);
        cache.access(3, &mut req(4.0, 3, 8), Status::empty());

        let metrics = crate::metrics::CacheMetrics::metrics(&cache);
        assert_eq!(metrics["requests"], 4.0);
        assert_eq!(metrics["cache_hits"], 1.0);
        assert_eq!(metrics["dirty_marks"], 2.0);
        assert_eq!(metrics["trace_records"], 1.0);
        assert_eq!(metrics["evictions"], 1.0);
    }
}
