//! Arena-backed recency list.
//!
//! This module provides the recency-order backbone of the caches: an ordered
//! sequence of keys with the least-recently-used key at the front and the
//! most-recently-used key at the back. All reordering operations are O(1).
//!
//! The classic implementation threads raw pointers (or `std::list` iterators)
//! through the cache's key map. Here the doubly linked structure lives in a
//! slot arena addressed by stable indices instead: each slot carries a
//! generation counter that is bumped when the slot is freed, so a
//! [`RecencyHandle`] held by the entry store can never silently alias a
//! different key after slot reuse. This keeps the whole structure free of
//! `unsafe`.
//!
//! **Note**: This module is internal infrastructure. Handles are only
//! meaningful to the cache core that created them.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt;

/// An opaque reference to one key's position in a [`RecencyList`].
///
/// A handle stays valid as long as its key remains in the list; unlike a
/// `std::list` iterator it survives [`RecencyList::move_to_back`]. Removal
/// frees the slot and bumps its generation, after which the handle is stale
/// and any use of it is a fatal contract violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyHandle {
    slot: usize,
    generation: u64,
}

enum SlotState<K> {
    Occupied {
        key: K,
        prev: Option<usize>,
        next: Option<usize>,
    },
    Free {
        next_free: Option<usize>,
    },
}

struct Slot<K> {
    generation: u64,
    state: SlotState<K>,
}

/// An ordered sequence of keys, least-recently-used at the front.
///
/// Backed by a slot arena with an embedded free list. Slots are recycled
/// after removal, so memory stays proportional to the peak number of live
/// keys.
pub struct RecencyList<K> {
    slots: Vec<Slot<K>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_head: Option<usize>,
    len: usize,
}

impl<K> RecencyList<K> {
    /// Creates an empty list with room for `capacity` keys before the arena
    /// reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        RecencyList {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_head: None,
            len: 0,
        }
    }

    /// Returns the current number of keys in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list contains no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `handle` still refers to a live key in this list.
    pub fn is_valid(&self, handle: RecencyHandle) -> bool {
        match self.slots.get(handle.slot) {
            Some(slot) => {
                slot.generation == handle.generation
                    && matches!(slot.state, SlotState::Occupied { .. })
            }
            None => false,
        }
    }

    /// Returns the least-recently-used key, if any.
    pub fn front(&self) -> Option<&K> {
        self.head.map(|idx| match &self.slots[idx].state {
            SlotState::Occupied { key, .. } => key,
            SlotState::Free { .. } => unreachable!("head points at a free slot"),
        })
    }

    /// Returns the most-recently-used key, if any.
    pub fn back(&self) -> Option<&K> {
        self.tail.map(|idx| match &self.slots[idx].state {
            SlotState::Occupied { key, .. } => key,
            SlotState::Free { .. } => unreachable!("tail points at a free slot"),
        })
    }

    /// Appends `key` at the back (most-recently-used position).
    ///
    /// Returns a handle to the new position.
    pub fn push_back(&mut self, key: K) -> RecencyHandle {
        let prev_tail = self.tail;
        let idx = match self.free_head {
            Some(free_idx) => {
                let slot = &mut self.slots[free_idx];
                self.free_head = match slot.state {
                    SlotState::Free { next_free } => next_free,
                    SlotState::Occupied { .. } => unreachable!("free list points at a live slot"),
                };
                slot.state = SlotState::Occupied {
                    key,
                    prev: prev_tail,
                    next: None,
                };
                free_idx
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Occupied {
                        key,
                        prev: prev_tail,
                        next: None,
                    },
                });
                self.slots.len() - 1
            }
        };

        if let Some(tail_idx) = prev_tail {
            if let SlotState::Occupied { next, .. } = &mut self.slots[tail_idx].state {
                *next = Some(idx);
            }
        } else {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
        self.len += 1;

        RecencyHandle {
            slot: idx,
            generation: self.slots[idx].generation,
        }
    }

    /// Moves the key behind `handle` to the back (most-recently-used
    /// position). The handle remains valid.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is stale.
    pub fn move_to_back(&mut self, handle: RecencyHandle) {
        assert!(self.is_valid(handle), "move_to_back with a stale handle");
        if self.tail == Some(handle.slot) {
            return;
        }
        self.unlink(handle.slot);

        let prev_tail = self.tail;
        if let SlotState::Occupied { prev, next, .. } = &mut self.slots[handle.slot].state {
            *prev = prev_tail;
            *next = None;
        }
        if let Some(tail_idx) = prev_tail {
            if let SlotState::Occupied { next, .. } = &mut self.slots[tail_idx].state {
                *next = Some(handle.slot);
            }
        } else {
            self.head = Some(handle.slot);
        }
        self.tail = Some(handle.slot);
    }

    /// Removes and returns the least-recently-used key.
    ///
    /// Any handle that referred to the removed key becomes stale.
    pub fn pop_front(&mut self) -> Option<K> {
        let idx = self.head?;
        self.unlink(idx);
        Some(self.release(idx))
    }

    /// Removes the key behind `handle` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is stale.
    pub fn remove(&mut self, handle: RecencyHandle) -> K {
        assert!(self.is_valid(handle), "remove with a stale handle");
        self.unlink(handle.slot);
        self.release(handle.slot)
    }

    /// Iterates over keys from least- to most-recently-used.
    pub fn iter(&self) -> RecencyIter<'_, K> {
        RecencyIter {
            list: self,
            cursor: self.head,
        }
    }

    /// Removes every key from the list. Slot generations are preserved so
    /// that handles issued before the clear stay stale.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Detaches `idx` from its neighbors without freeing the slot.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.slots[idx].state {
            SlotState::Occupied { prev, next, .. } => (*prev, *next),
            SlotState::Free { .. } => unreachable!("unlink of a free slot"),
        };
        match prev {
            Some(prev_idx) => {
                if let SlotState::Occupied { next: n, .. } = &mut self.slots[prev_idx].state {
                    *n = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next_idx) => {
                if let SlotState::Occupied { prev: p, .. } = &mut self.slots[next_idx].state {
                    *p = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Frees a detached slot, bumping its generation, and returns its key.
    fn release(&mut self, idx: usize) -> K {
        let next_free = self.free_head;
        let slot = &mut self.slots[idx];
        slot.generation += 1;
        let state = core::mem::replace(&mut slot.state, SlotState::Free { next_free });
        self.free_head = Some(idx);
        self.len -= 1;
        match state {
            SlotState::Occupied { key, .. } => key,
            SlotState::Free { .. } => unreachable!("release of a free slot"),
        }
    }
}

/// Iterator over a [`RecencyList`] from LRU to MRU.
pub struct RecencyIter<'a, K> {
    list: &'a RecencyList<K>,
    cursor: Option<usize>,
}

impl<'a, K> Iterator for RecencyIter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        let idx = self.cursor?;
        match &self.list.slots[idx].state {
            SlotState::Occupied { key, next, .. } => {
                self.cursor = *next;
                Some(key)
            }
            SlotState::Free { .. } => unreachable!("iterator reached a free slot"),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for RecencyList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecencyList")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn order<K: Clone>(list: &RecencyList<K>) -> Vec<K> {
        list.iter().cloned().collect()
    }

    #[test]
    fn test_push_back_orders_lru_to_mru() {
        let mut list = RecencyList::with_capacity(3);
        list.push_back(10);
        list.push_back(20);
        list.push_back(30);
        assert_eq!(list.len(), 3);
        assert_eq!(order(&list), [10, 20, 30]);
        assert_eq!(list.front(), Some(&10));
        assert_eq!(list.back(), Some(&30));
    }

    #[test]
    fn test_move_to_back_refreshes_recency() {
        let mut list = RecencyList::with_capacity(3);
        let h10 = list.push_back(10);
        let _h20 = list.push_back(20);
        let h30 = list.push_back(30);

        list.move_to_back(h10);
        assert_eq!(order(&list), [20, 30, 10]);

        // Moving the current tail is a no-op.
        list.move_to_back(h10);
        assert_eq!(order(&list), [20, 30, 10]);

        list.move_to_back(h30);
        assert_eq!(order(&list), [20, 10, 30]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_handle_survives_move_to_back() {
        let mut list = RecencyList::with_capacity(2);
        let h = list.push_back("a");
        list.push_back("b");
        list.move_to_back(h);
        assert!(list.is_valid(h));
        assert_eq!(list.remove(h), "a");
        assert!(!list.is_valid(h));
    }

    #[test]
    fn test_pop_front_returns_lru() {
        let mut list = RecencyList::with_capacity(2);
        assert_eq!(list.pop_front(), None::<u32>);
        list.push_back(1);
        list.push_back(2);
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_front(), Some(2));
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut list = RecencyList::with_capacity(2);
        let h1 = list.push_back(1);
        assert_eq!(list.remove(h1), 1);

        // The freed slot is recycled for the next key.
        let h2 = list.push_back(2);
        assert!(!list.is_valid(h1));
        assert!(list.is_valid(h2));
        assert_eq!(order(&list), [2]);
    }

    #[test]
    #[should_panic(expected = "stale handle")]
    fn test_stale_handle_is_fatal() {
        let mut list = RecencyList::with_capacity(2);
        let h = list.push_back(1);
        list.remove(h);
        list.move_to_back(h);
    }

    #[test]
    fn test_remove_middle_relinks_neighbors() {
        let mut list = RecencyList::with_capacity(3);
        list.push_back(1);
        let h2 = list.push_back(2);
        list.push_back(3);
        assert_eq!(list.remove(h2), 2);
        assert_eq!(order(&list), [1, 3]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_clear_empties_and_invalidates() {
        let mut list = RecencyList::with_capacity(3);
        let h = list.push_back(1);
        list.push_back(2);
        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_valid(h));
        let h2 = list.push_back(9);
        assert!(list.is_valid(h2));
        assert_eq!(order(&list), [9]);
    }

    #[test]
    fn test_interleaved_churn_keeps_order_consistent() {
        let mut list = RecencyList::with_capacity(4);
        let mut handles = Vec::new();
        for k in 0..4 {
            handles.push(list.push_back(k));
        }
        list.move_to_back(handles[0]);
        assert_eq!(list.pop_front(), Some(1));
        list.move_to_back(handles[2]);
        let h4 = list.push_back(4);
        assert_eq!(order(&list), [3, 0, 2, 4]);
        list.remove(h4);
        assert_eq!(order(&list), [3, 0, 2]);
    }
}
