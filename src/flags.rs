//! Access status flags.
//!
//! Every call to `access` takes a caller-supplied [`Status`] word and returns
//! it with outcome bits merged in. The numeric bit positions are part of the
//! external contract: trace consumers and simulation drivers match on them,
//! so they must never be renumbered.
//!
//! The cache only ever *adds* bits across a call to `access`; caller-supplied
//! bits (most importantly [`Status::WRITE`]) are never cleared. The one
//! exception is the flag field stored *inside* a cached value, where the
//! periodic flush sweep clears [`Status::DIRTY`] — that is entry state, not
//! the status word returned to the caller.

use bitflags::bitflags;

bitflags! {
    /// Bit field describing the nature and outcome of a cache access.
    ///
    /// `WRITE` is the only input bit; the rest are outcome bits merged into
    /// the returned status by the cache.
    ///
    /// # Examples
    ///
    /// ```
    /// use memo_cache::Status;
    ///
    /// let out = Status::WRITE | Status::MISS | Status::EVICT;
    /// assert!(out.contains(Status::WRITE));
    /// assert!(!out.contains(Status::HIT));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u32 {
        /// The access is a write (caller input).
        const WRITE = 1 << 0;
        /// The key was not cached (base variant outcome).
        const MISS = 1 << 1;
        /// The key was cached (base variant outcome).
        const HIT = 1 << 2;
        /// Inserting the entry displaced the least-recently-used entry.
        const EVICT = 1 << 3;
        /// The entry has been modified since the last flush sweep.
        const DIRTY = 1 << 4;
        /// The page was not cached (page variant outcome).
        const PAGEMISS = 1 << 5;
        /// The page was cached (page variant outcome).
        const PAGEHIT = 1 << 6;
        /// Set alongside `PAGEHIT`: the backing block was resident.
        const BLKHIT = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions_are_stable() {
        // External consumers depend on these exact values.
        assert_eq!(Status::WRITE.bits(), 1);
        assert_eq!(Status::MISS.bits(), 2);
        assert_eq!(Status::HIT.bits(), 4);
        assert_eq!(Status::EVICT.bits(), 8);
        assert_eq!(Status::DIRTY.bits(), 16);
        assert_eq!(Status::PAGEMISS.bits(), 32);
        assert_eq!(Status::PAGEHIT.bits(), 64);
        assert_eq!(Status::BLKHIT.bits(), 128);
    }

    #[test]
    fn test_merge_preserves_caller_bits() {
        let input = Status::WRITE;
        let out = input | Status::PAGEMISS | Status::DIRTY | Status::EVICT;
        assert!(out.contains(input));
    }

    #[test]
    fn test_clear_dirty_leaves_other_bits() {
        let mut flags = Status::WRITE | Status::DIRTY | Status::PAGEHIT;
        flags.remove(Status::DIRTY);
        assert!(flags.contains(Status::WRITE));
        assert!(flags.contains(Status::PAGEHIT));
        assert!(!flags.contains(Status::DIRTY));
    }
}
