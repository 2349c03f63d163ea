//! Value capability surface for the page-aware cache.
//!
//! The page cache does not interpret its values beyond a narrow capability
//! surface: read the request metadata carried by the value (issue time, block
//! number, request size) and read or replace its flag field. [`PageValue`]
//! captures exactly that surface, keeping the cache decoupled from whatever
//! object model the simulation driver uses.
//!
//! [`PageRequest`] is a ready-made payload implementing the trait, mirroring
//! the request records a disk-simulation trace carries per access.

use crate::flags::Status;
use core::fmt;

/// Capability surface the page-aware cache requires of its values.
///
/// The cache reads the metadata accessors when emitting eviction trace
/// records and uses [`flags`](PageValue::flags) /
/// [`set_flags`](PageValue::set_flags) for dirty tracking: a write access
/// stamps `DIRTY` into the value, and the periodic flush sweep clears it
/// again.
pub trait PageValue {
    /// Logical time at which the request carried by this value was issued.
    fn issue_time(&self) -> f64;

    /// Block number of the request, as recorded in the backing trace.
    fn block_number(&self) -> u64;

    /// Size of the request, in the trace's native unit (sectors or bytes).
    fn request_size(&self) -> u64;

    /// Current flag field of this value.
    fn flags(&self) -> Status;

    /// Replaces the flag field of this value.
    fn set_flags(&mut self, flags: Status);
}

/// A plain page request record: the metadata one line of a disk-simulation
/// trace describes, plus the mutable flag field the cache maintains.
///
/// # Examples
///
/// ```
/// use memo_cache::{PageRequest, PageValue, Status};
///
/// let mut req = PageRequest::new(12.5, 4096, 8);
/// assert_eq!(req.block_number(), 4096);
/// req.set_flags(Status::WRITE | Status::DIRTY);
/// assert!(req.flags().contains(Status::DIRTY));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Logical issue time of the request.
    pub issue_time: f64,
    /// Block number addressed by the request.
    pub block_number: u64,
    /// Request size in the trace's native unit.
    pub request_size: u64,
    /// Flag field; the cache stamps and clears `DIRTY` here.
    pub flags: Status,
}

impl PageRequest {
    /// Creates a request with empty flags.
    pub fn new(issue_time: f64, block_number: u64, request_size: u64) -> Self {
        PageRequest {
            issue_time,
            block_number,
            request_size,
            flags: Status::empty(),
        }
    }
}

impl PageValue for PageRequest {
    #[inline]
    fn issue_time(&self) -> f64 {
        self.issue_time
    }

    #[inline]
    fn block_number(&self) -> u64 {
        self.block_number
    }

    #[inline]
    fn request_size(&self) -> u64 {
        self.request_size
    }

    #[inline]
    fn flags(&self) -> Status {
        self.flags
    }

    #[inline]
    fn set_flags(&mut self, flags: Status) {
        self.flags = flags;
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blk {} size {} at t={}",
            self.block_number, self.request_size, self.issue_time
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_has_empty_flags() {
        let req = PageRequest::new(0.0, 100, 8);
        assert_eq!(req.flags(), Status::empty());
        assert_eq!(req.issue_time(), 0.0);
        assert_eq!(req.request_size(), 8);
    }

    #[test]
    fn test_set_flags_replaces_field() {
        let mut req = PageRequest::new(1.0, 1, 1);
        req.set_flags(Status::WRITE | Status::DIRTY);
        assert!(req.flags().contains(Status::WRITE));
        req.set_flags(Status::WRITE);
        assert!(!req.flags().contains(Status::DIRTY));
    }
}
