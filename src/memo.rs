//! Base memoizing LRU cache.
//!
//! [`MemoCache`] caches the results of a compute function `(key, aux) ->
//! value` under a fixed capacity with LRU replacement. Its distinguishing
//! policy is *write-allocate-on-miss*: a miss only populates the cache when
//! the caller's status marks the access as a write, so read-through traffic
//! cannot pollute the cache.
//!
//! A hit refreshes the entry's recency and leaves its value untouched. When
//! an insertion into a full cache evicts the least-recently-used entry, an
//! optional eviction hook is notified with the victim key before the purge,
//! for external bookkeeping.
//!
//! # Examples
//!
//! ```
//! use memo_cache::config::MemoCacheConfig;
//! use memo_cache::{MemoCache, Status};
//! use core::num::NonZeroUsize;
//!
//! let config = MemoCacheConfig::new(NonZeroUsize::new(2).unwrap());
//! let mut cache = MemoCache::init(config, |key: &u64, aux: &u64| key + aux);
//!
//! // Write misses populate the cache.
//! let status = cache.access(10, &mut 5, Status::WRITE);
//! assert!(status.contains(Status::MISS));
//! assert_eq!(cache.peek(&10), Some(&15));
//!
//! // Read misses do not.
//! let status = cache.access(11, &mut 5, Status::empty());
//! assert!(status.contains(Status::MISS));
//! assert_eq!(cache.len(), 1);
//! ```

extern crate alloc;

use crate::config::MemoCacheConfig;
use crate::engine::{AccessPolicy, CacheEngine};
use crate::flags::Status;
use crate::list::RecencyIter;
use crate::metrics::{CacheMetrics, CoreCacheMetrics, MemoCacheMetrics};
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt;
use core::num::NonZeroUsize;

/// Write-allocate-on-miss policy with a victim-notification hook.
pub struct MemoPolicy<E> {
    on_evict: E,
}

impl<E> MemoPolicy<E> {
    /// Creates the policy around an eviction hook.
    pub fn new(on_evict: E) -> Self {
        MemoPolicy { on_evict }
    }
}

impl<K, V, E: FnMut(&K)> AccessPolicy<K, V> for MemoPolicy<E> {
    fn admit_on_miss(&self, status: Status) -> bool {
        // Write buffer semantics: only write misses allocate.
        status.contains(Status::WRITE)
    }

    fn replace_on_hit(&self) -> bool {
        false
    }

    fn hit_flags(&self) -> Status {
        Status::HIT
    }

    fn miss_flags(&self) -> Status {
        Status::MISS
    }

    fn on_evict(&mut self, key: &K, _victim: &V, _aux: &V) {
        (self.on_evict)(key);
    }
}

impl<E> fmt::Debug for MemoPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoPolicy").finish_non_exhaustive()
    }
}

fn noop_hook<K>(_key: &K) {}

/// Fixed-capacity LRU cache memoizing a function `(key, aux) -> value`.
///
/// See the [module docs](self) for the access semantics. All contract
/// violations (removal from an empty cache, removal of an absent key) are
/// fatal; routine outcomes are reported through the returned [`Status`].
pub struct MemoCache<K, V, F, E = fn(&K)> {
    engine: CacheEngine<K, V, F, MemoPolicy<E>>,
}

impl<K, V, F> MemoCache<K, V, F, fn(&K)>
where
    K: Ord + Clone,
    F: FnMut(&K, &V) -> V,
{
    /// Creates a cache from its configuration and compute function, without
    /// an eviction hook.
    pub fn init(config: MemoCacheConfig, compute: F) -> Self {
        Self::with_eviction_hook(config, compute, noop_hook)
    }
}

impl<K, V, F, E> MemoCache<K, V, F, E>
where
    K: Ord + Clone,
    F: FnMut(&K, &V) -> V,
    E: FnMut(&K),
{
    /// Creates a cache whose evictions notify `on_evict` with the victim key
    /// before the entry is purged.
    pub fn with_eviction_hook(config: MemoCacheConfig, compute: F, on_evict: E) -> Self {
        MemoCache {
            engine: CacheEngine::new(config.capacity, compute, MemoPolicy::new(on_evict)),
        }
    }

    /// Performs one access for `key`.
    ///
    /// On a hit, moves `key` to the most-recently-used position and returns
    /// `status | HIT`; the cached value is unchanged. On a miss, invokes the
    /// compute function and inserts the result only if `status` contains
    /// [`Status::WRITE`], returning `status | MISS` (with `EVICT` merged in
    /// when the insertion displaced the LRU entry).
    pub fn access(&mut self, key: K, aux: &mut V, status: Status) -> Status {
        self.engine.access(key, aux, status)
    }

    /// Explicitly evicts `key`, purging it from both the entry store and the
    /// recency order.
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty or `key` is not cached.
    pub fn remove(&mut self, key: &K) {
        self.engine.remove(key);
    }
}

impl<K: Ord + Clone, V, F, E> MemoCache<K, V, F, E> {
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

    /// Number of cached entries.
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

    /// Purges every entry; counters are preserved.
    pub fn clear(&mut self) {
        self.engine.clear();
    }

    /// Core counters maintained by the cache.
    pub fn core_metrics(&self) -> &CoreCacheMetrics {
        self.engine.metrics()
    }
}

impl<K: Ord + Clone, V, F, E> CacheMetrics for MemoCache<K, V, F, E> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        MemoCacheMetrics {
            core: self.engine.metrics().clone(),
        }
        .metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        "MEMO-LRU"
    }
}

impl<K: fmt::Debug + Ord, V, F, E> fmt::Debug for MemoCache<K, V, F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("engine", &self.engine)
            .finish()
    }
}
