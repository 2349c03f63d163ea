//! Fixed-capacity LRU memoization caches for simulation workloads.
//!
//! This crate provides two single-threaded, `no_std`-compatible cache
//! variants built on one shared LRU engine:
//!
//! - [`MemoCache`]: a memoizing lookup cache with write-allocate admission.
//!   Read misses compute but do not cache; write misses allocate; hits
//!   refresh recency in place. An optional eviction hook observes victims
//!   before they are purged.
//! - [`PageCache`]: a page-aware variant with dirty tracking, periodic
//!   flush sweeps, recompute-and-replace hits, and fixed-width eviction
//!   trace records written to a pluggable [`TraceSink`].
//!
//! Both report outcomes through the [`Status`] bitflags and expose
//! key-ordered `min_key`/`max_key` queries alongside the usual recency
//! queries. Contract violations (removing from an empty cache, accessing
//! with a zero-capacity configuration) are programming errors and panic
//! rather than returning errors; see the individual methods for their
//! panic conditions.
//!
//! # Examples
//!
//! Memoizing expensive lookups, caching only written entries:
//!
//! ```
//! use memo_cache::config::MemoCacheConfig;
//! use memo_cache::{MemoCache, Status};
//! use core::num::NonZeroUsize;
//!
//! let config = MemoCacheConfig::new(NonZeroUsize::new(128).unwrap());
//! let mut cache = MemoCache::init(config, |key: &u64, _aux: &u64| key * 10);
//!
//! let status = cache.access(7, &mut 0, Status::WRITE);
//! assert!(status.contains(Status::MISS));
//! assert_eq!(cache.peek(&7), Some(&70));
//!
//! let status = cache.access(7, &mut 0, Status::empty());
//! assert!(status.contains(Status::HIT));
//! ```
//!
//! Tracing page evictions:
//!
//! ```
//! use memo_cache::config::PageCacheConfig;
//! use memo_cache::trace::VecSink;
//! use memo_cache::{PageCache, PageRequest, Status};
//! use core::num::NonZeroUsize;
//!
//! let config = PageCacheConfig::new(NonZeroUsize::new(1).unwrap());
//! let mut cache = PageCache::init(
//!     config,
//!     |_key: &u64, aux: &PageRequest| aux.clone(),
//!     VecSink::new(),
//! );
//!
//! cache.access(100, &mut PageRequest::new(0.5, 100, 8), Status::WRITE);
//! cache.access(200, &mut PageRequest::new(1.5, 200, 8), Status::WRITE);
//! assert_eq!(cache.into_sink().lines().len(), 1);
//! ```
//!
//! # Crate features
//!
//! - `std` (off by default): enables `trace::WriterSink` for writing
//!   trace lines to any `std::io::Write` destination.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod engine;
pub mod flags;
pub mod list;
pub mod memo;
pub mod metrics;
pub mod page;
pub mod trace;
pub mod value;

pub use config::{MemoCacheConfig, PageCacheConfig};
pub use flags::Status;
pub use memo::MemoCache;
pub use metrics::CacheMetrics;
pub use page::PageCache;
pub use trace::{EvictionRecord, NullSink, TraceSink, VecSink};
pub use value::{PageRequest, PageValue};
