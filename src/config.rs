//! Cache configuration structures.
//!
//! Each cache variant has a dedicated configuration struct with public
//! fields: create the struct with every field set, or use the `new`
//! constructor for the defaults.
//!
//! Capacity is a [`NonZeroUsize`] throughout. An LRU cache with capacity
//! zero is a configuration error, not an "unbounded" cache, and the type
//! makes the invalid configuration unrepresentable instead of checking it on
//! every access.
//!
//! # Examples
//!
//! ```
//! use memo_cache::config::{MemoCacheConfig, PageCacheConfig};
//! use core::num::NonZeroUsize;
//!
//! let memo = MemoCacheConfig {
//!     capacity: NonZeroUsize::new(1024).unwrap(),
//! };
//!
//! // Page cache flushing dirty entries every 30 logical time units.
//! let page = PageCacheConfig::new(NonZeroUsize::new(1024).unwrap());
//! assert_eq!(page.flush_interval, PageCacheConfig::DEFAULT_FLUSH_INTERVAL);
//! assert_eq!(memo.capacity, page.capacity);
//! ```

use core::fmt;
use core::num::NonZeroUsize;

/// Configuration for the base memoizing LRU cache.
///
/// # Fields
///
/// - `capacity`: maximum number of entries the cache can hold. Eviction of
///   the least-recently-used entry happens when a write miss inserts into a
///   full cache.
#[derive(Clone, Copy)]
pub struct MemoCacheConfig {
    /// Maximum number of key-value pairs the cache can hold.
    pub capacity: NonZeroUsize,
}

impl MemoCacheConfig {
    /// Creates a configuration with the given capacity.
    pub fn new(capacity: NonZeroUsize) -> Self {
        MemoCacheConfig { capacity }
    }
}

impl fmt::Debug for MemoCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCacheConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Configuration for the page-aware dirty-tracking LRU cache.
///
/// # Fields
///
/// - `capacity`: maximum number of cached pages.
/// - `flush_interval`: length, in logical time units, of the periodic flush
///   window. The first access whose issue time reaches a multiple of this
///   interval triggers a sweep that clears the `DIRTY` bit on every cached
///   page.
#[derive(Clone, Copy)]
pub struct PageCacheConfig {
    /// Maximum number of pages the cache can hold.
    pub capacity: NonZeroUsize,
    /// Flush-boundary interval in logical time units.
    pub flush_interval: f64,
}

impl PageCacheConfig {
    /// Flush interval matching the storage simulator convention of flushing
    /// the page cache every 30 seconds of simulated time.
    pub const DEFAULT_FLUSH_INTERVAL: f64 = 30.0;

    /// Creates a configuration with the default flush interval.
    pub fn new(capacity: NonZeroUsize) -> Self {
        PageCacheConfig {
            capacity,
            flush_interval: Self::DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl fmt::Debug for PageCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCacheConfig")
            .field("capacity", &self.capacity)
            .field("flush_interval", &self.flush_interval)
            .finish()
    }
}
