//! Pending set: sleepers whose countdown has finished.
//!
//! One fixed budget of `capacity` entries is shared by two disjoint regions:
//! the deferred queue, drained FIFO by `run_any_pending()`, and the immediate
//! scratch area the tick handler fills and empties within a single tick. A push
//! that would make the regions meet is refused instead of overwriting an entry.

use std::collections::VecDeque;

use crate::core::sleeper::WakeMode;
use crate::core::SharedSleeper;

/// Due sleepers awaiting execution.
pub struct PendingSet {
    deferred: VecDeque<SharedSleeper>,
    immediate: Vec<SharedSleeper>,
    capacity: usize,
}

impl PendingSet {
    /// Create an empty set with room for `capacity` entries across both regions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            deferred: VecDeque::with_capacity(capacity),
            immediate: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Entries held across both regions.
    fn len(&self) -> usize {
        self.deferred.len() + self.immediate.len()
    }

    /// Shared budget.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries waiting for the main loop.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Snapshot a due sleeper into the region for its mode.
    ///
    /// Returns `false` when the regions would collide; the entry is not stored.
    pub fn push(&mut self, sleeper: SharedSleeper, mode: WakeMode) -> bool {
        if self.len() >= self.capacity {
            return false;
        }
        match mode {
            WakeMode::Immediate => self.immediate.push(sleeper),
            WakeMode::Deferred => self.deferred.push_back(sleeper),
        }
        true
    }

    /// Oldest deferred entry.
    pub fn pop_deferred(&mut self) -> Option<SharedSleeper> {
        self.deferred.pop_front()
    }

    /// Empty the immediate scratch area, in the order the entries were found due.
    pub fn take_immediate(&mut self) -> Vec<SharedSleeper> {
        self.immediate.drain(..).collect()
    }

    /// Drop everything in both regions.
    pub fn clear(&mut self) {
        self.deferred.clear();
        self.immediate.clear();
    }
}

impl std::fmt::Debug for PendingSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSet")
            .field("deferred", &self.deferred.len())
            .field("immediate", &self.immediate.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
