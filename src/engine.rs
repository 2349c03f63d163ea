//! Shared cache engine.
//!
//! Both cache variants are the same machine: a key-ordered entry store, a
//! recency list, and a memoized compute function, differing only in policy
//! decisions (when a miss populates the cache, what a hit does, what happens
//! around an eviction). [`CacheEngine`] implements the machine once and takes
//! those decisions from an injected [`AccessPolicy`], instead of duplicating
//! the access path per variant.
//!
//! # Failure semantics
//!
//! All invariant violations are caller-contract violations and panic:
//! removal from an empty cache, removal of an absent key, insertion of a
//! present key, a post-eviction size that still does not permit insertion.
//! Routine outcomes (hit, miss, eviction, dirty) travel exclusively in the
//! returned [`Status`] bits; there is no recoverable error path inside the
//! engine.

extern crate alloc;

use crate::flags::Status;
use crate::list::{RecencyHandle, RecencyIter, RecencyList};
use crate::metrics::CoreCacheMetrics;
use alloc::collections::BTreeMap;
use core::fmt;
use core::num::NonZeroUsize;

/// The two owned structures of a cache: entry store plus recency list.
///
/// The entry store maps each key to its value and to a handle for the key's
/// position in the recency list. The store is a `BTreeMap` rather than a hash
/// map because the query surface includes boundary lookups by *key* order
/// ([`min_key`](CacheCore::min_key) / [`max_key`](CacheCore::max_key)),
/// independent of recency order.
///
/// Invariants, checked at the mutation points:
/// - a key appears at most once in the store and at most once in the list;
/// - store and list always hold exactly the same key set;
/// - `len() <= capacity` at every observation point;
/// - every stored handle refers to its own key's current list position.
pub struct CacheCore<K, V> {
    capacity: NonZeroUsize,
    map: BTreeMap<K, (V, RecencyHandle)>,
    list: RecencyList<K>,
}

impl<K, V> CacheCore<K, V> {
    /// The fixed capacity set at construction.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Ord + Clone, V> CacheCore<K, V> {
    /// Creates an empty core with the given fixed capacity.
    pub fn new(capacity: NonZeroUsize) -> Self {
        CacheCore {
            capacity,
            map: BTreeMap::new(),
            list: RecencyList::with_capacity(capacity.get()),
        }
    }

    /// Returns true if `key` is cached.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns the cached value for `key` without touching recency order.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|(value, _)| value)
    }

    /// Mutable access to the cached value for `key`, without touching
    /// recency order.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key).map(|(value, _)| value)
    }

    /// Moves `key` to the most-recently-used position.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not cached.
    pub fn touch(&mut self, key: &K) {
        let (_, handle) = self
            .map
            .get(key)
            .expect("touch of a key that is not cached");
        self.list.move_to_back(*handle);
    }

    /// Inserts `key` at the most-recently-used position.
    ///
    /// # Panics
    ///
    /// Panics if `key` is already cached or the cache is full. Making room
    /// is the engine's job; the core never evicts on its own.
    pub fn insert_mru(&mut self, key: K, value: V) {
        assert!(
            !self.map.contains_key(&key),
            "insert of a key already cached"
        );
        assert!(
            self.map.len() < self.capacity.get(),
            "insert into a cache already at capacity"
        );
        let handle = self.list.push_back(key.clone());
        self.map.insert(key, (value, handle));
    }

    /// Purges `key` from both structures and returns its value.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not cached.
    pub fn erase(&mut self, key: &K) -> V {
        let (value, handle) = self
            .map
            .remove(key)
            .expect("erase of a key that is not cached");
        self.list.remove(handle);
        debug_assert_eq!(self.map.len(), self.list.len());
        value
    }

    /// The current least-recently-used key, if any.
    pub fn lru_key(&self) -> Option<&K> {
        self.list.front()
    }

    /// The smallest cached key by key order, independent of recency.
    pub fn min_key(&self) -> Option<&K> {
        self.map.first_key_value().map(|(k, _)| k)
    }

    /// The largest cached key by key order, independent of recency.
    pub fn max_key(&self) -> Option<&K> {
        self.map.last_key_value().map(|(k, _)| k)
    }

    /// Iterates over cached keys from least- to most-recently-used.
    pub fn iter_lru(&self) -> RecencyIter<'_, K> {
        self.list.iter()
    }

    /// Applies `f` to every cached entry in recency order (LRU first),
    /// with mutable access to the value.
    pub fn for_each_lru<F: FnMut(&K, &mut V)>(&mut self, mut f: F) {
        let CacheCore { map, list, .. } = self;
        for key in list.iter() {
            if let Some((value, _)) = map.get_mut(key) {
                f(key, value);
            }
        }
    }

    /// Purges every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }
}

impl<K: fmt::Debug + Ord, V> fmt::Debug for CacheCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCore")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
            .finish()
    }
}

/// The policy seam between the engine and its two variants.
///
/// A policy decides what the shared access path cannot: whether a miss
/// populates the cache, whether a hit refreshes recency or recomputes and
/// replaces the entry, which outcome bits name a hit and a miss, and what
/// bookkeeping surrounds evictions and removals.
pub trait AccessPolicy<K, V> {
    /// Runs before hit/miss classification. May mutate the auxiliary value
    /// and the cached entries (dirty marking, flush sweeps) and returns the
    /// possibly-extended status word.
    fn before_access(&mut self, core: &mut CacheCore<K, V>, aux: &mut V, status: Status) -> Status {
        let _ = (core, aux);
        status
    }

    /// Whether a miss with the given (already pre-processed) status should
    /// insert the freshly computed value.
    fn admit_on_miss(&self, status: Status) -> bool;

    /// Whether a hit erases the old entry and inserts a freshly computed one
    /// (`true`), or only refreshes recency (`false`).
    fn replace_on_hit(&self) -> bool;

    /// Outcome bits merged into the returned status on a hit.
    fn hit_flags(&self) -> Status;

    /// Outcome bits merged into the returned status on a miss.
    fn miss_flags(&self) -> Status;

    /// Called with the victim entry just before a capacity eviction purges
    /// it. `aux` is the auxiliary value of the access that triggered the
    /// eviction.
    fn on_evict(&mut self, key: &K, victim: &V, aux: &V);

    /// Called with the entry just before an explicit removal purges it.
    /// `aux` is present when the removal carries a triggering access.
    fn on_remove(&mut self, key: &K, victim: &V, aux: Option<&V>) {
        let _ = (key, victim, aux);
    }
}

/// Fixed-capacity, recency-ordered memoizing cache engine.
///
/// Composes [`CacheCore`], a compute function invoked on every miss (and, for
/// policies that recompute on hit, on every access), and an [`AccessPolicy`].
/// Callers normally use the [`MemoCache`](crate::MemoCache) or
/// [`PageCache`](crate::PageCache) wrappers instead of the engine directly.
pub struct CacheEngine<K, V, F, P> {
    core: CacheCore<K, V>,
    compute: F,
    policy: P,
    metrics: CoreCacheMetrics,
}

impl<K, V, F, P> CacheEngine<K, V, F, P>
where
    K: Ord + Clone,
    F: FnMut(&K, &V) -> V,
    P: AccessPolicy<K, V>,
{
    /// Creates an engine with the given capacity, compute function, and
    /// policy.
    pub fn new(capacity: NonZeroUsize, compute: F, policy: P) -> Self {
        CacheEngine {
            core: CacheCore::new(capacity),
            compute,
            policy,
            metrics: CoreCacheMetrics::new(),
        }
    }

    /// Performs one access for `key`.
    ///
    /// The returned status is the caller's `status` with outcome bits merged
    /// in; caller bits are never cleared. `aux` is the auxiliary input passed
    /// through to the compute function and, for the page policy, the carrier
    /// of the access's request metadata and flag field.
    pub fn access(&mut self, key: K, aux: &mut V, status: Status) -> Status {
        let mut status = self.policy.before_access(&mut self.core, aux, status);

        if self.core.contains(&key) {
            self.metrics.record_hit();
            if self.policy.replace_on_hit() {
                // Recompute-and-replace: purge the stale entry, then insert
                // the fresh value as MRU. Erasing first guarantees room.
                self.core.erase(&key);
                let value = (self.compute)(&key, aux);
                self.core.insert_mru(key, value);
                self.metrics.record_insertion();
            } else {
                self.core.touch(&key);
            }
            status | self.policy.hit_flags()
        } else {
            self.metrics.record_miss();
            let value = (self.compute)(&key, aux);
            if self.policy.admit_on_miss(status) {
                status |= self.insert(key, value, aux);
            }
            status | self.policy.miss_flags()
        }
    }

    /// Explicitly purges `key`.
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty or `key` is not cached.
    pub fn remove(&mut self, key: &K) {
        self.remove_inner(key, None);
    }

    /// Explicitly purges `key`, attributing the removal to the access
    /// carrying `aux` (the page policy logs the trace record with `aux`'s
    /// issue time).
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty or `key` is not cached.
    pub fn remove_with(&mut self, key: &K, aux: &V) {
        self.remove_inner(key, Some(aux));
    }

    fn remove_inner(&mut self, key: &K, aux: Option<&V>) {
        assert!(!self.core.is_empty(), "remove on an empty cache");
        {
            let victim = self
                .core
                .get(key)
                .expect("remove of a key that is not cached");
            self.policy.on_remove(key, victim, aux);
        }
        self.core.erase(key);
        self.metrics.record_removal();
    }

    /// Inserts a fresh entry, evicting the LRU entry first when at capacity.
    /// Returns `EVICT` if an eviction was needed, empty status otherwise.
    fn insert(&mut self, key: K, value: V, aux: &V) -> Status {
        let mut status = Status::empty();
        if self.core.len() == self.core.capacity().get() {
            self.evict(aux);
            status |= Status::EVICT;
        }
        assert!(
            self.core.len() < self.core.capacity().get(),
            "eviction failed to make room"
        );
        self.core.insert_mru(key, value);
        self.metrics.record_insertion();
        status
    }

    /// Purges the strict head of the recency list (pure LRU, no secondary
    /// tie-break), notifying the policy first.
    fn evict(&mut self, aux: &V) {
        assert!(!self.core.is_empty(), "evict on an empty cache");
        let victim = self
            .core
            .lru_key()
            .cloned()
            .expect("non-empty cache has an LRU key");
        {
            let value = self
                .core
                .get(&victim)
                .expect("recency list and entry store agree");
            self.policy.on_evict(&victim, value, aux);
        }
        self.core.erase(&victim);
        self.metrics.record_eviction();
    }
}

impl<K: Ord + Clone, V, F, P> CacheEngine<K, V, F, P> {
    /// The smallest cached key by key order.
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty.
    pub fn min_key(&self) -> &K {
        self.core.min_key().expect("min_key on an empty cache")
    }

    /// The largest cached key by key order.
    ///
    /// # Panics
    ///
    /// Panics if the cache is empty.
    pub fn max_key(&self) -> &K {
        self.core.max_key().expect("max_key on an empty cache")
    }

    /// Number of cached entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns true if nothing is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// The fixed capacity set at construction.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.core.capacity()
    }

    /// Returns true if `key` is currently cached.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.core.contains(key)
    }

    /// Returns the cached value for `key` without refreshing its recency.
    #[inline]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.core.get(key)
    }

    /// Iterates over cached keys from least- to most-recently-used.
    pub fn iter_lru(&self) -> RecencyIter<'_, K> {
        self.core.iter_lru()
    }

    /// Purges every entry; counters are preserved.
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Core counters maintained by the engine.
    #[inline]
    pub fn metrics(&self) -> &CoreCacheMetrics {
        &self.metrics
    }

    /// The injected policy.
    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Mutable access to the injected policy (trace sink retrieval).
    #[inline]
    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Consumes the engine and returns its policy.
    pub fn into_policy(self) -> P {
        self.policy
    }
}

impl<K, V, F, P> fmt::Debug for CacheEngine<K, V, F, P>
where
    K: fmt::Debug + Ord,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("capacity", &self.core.capacity())
            .field("len", &self.core.len())
            .finish()
    }
}
