//! Fixed-capacity sleeper table.
//!
//! New sleepers take the first free bunk; when a one-shot sleeper leaves, the
//! topmost sleeper is moved into the vacated bunk so the occupied bunks always
//! form a contiguous prefix and scans only ever touch active requests.

use crate::core::sleeper::{Bunk, WakeMode};
use crate::core::{SharedSleeper, WakeupError};

/// Packed table of active wake requests.
#[derive(Debug)]
pub struct SleeperTable {
    bunks: Vec<Bunk>,
    capacity: usize,
}

impl SleeperTable {
    /// Create an empty table with room for `capacity` sleepers.
    ///
    /// Storage is reserved up front; admissions never reallocate.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bunks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of occupied bunks.
    pub fn len(&self) -> usize {
        self.bunks.len()
    }

    /// Whether no sleeper is waiting.
    pub fn is_empty(&self) -> bool {
        self.bunks.is_empty()
    }

    /// Total bunks.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bunks still available.
    pub fn free_slots(&self) -> usize {
        self.capacity - self.bunks.len()
    }

    #[cfg(test)]
    fn bunks(&self) -> &[Bunk] {
        &self.bunks
    }

    /// Put a sleeper into the next free bunk.
    pub fn admit(&mut self, bunk: Bunk) -> Result<(), WakeupError> {
        if self.bunks.len() >= self.capacity {
            return Err(WakeupError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.bunks.push(bunk);
        Ok(())
    }

    /// Shift every active countdown onto a common origin by removing time
    /// that has already elapsed.
    pub fn normalize(&mut self, elapsed_ms: i64) {
        if elapsed_ms <= 0 {
            return;
        }
        for bunk in &mut self.bunks {
            bunk.time_to_wake -= elapsed_ms;
        }
    }

    /// Smallest remaining countdown, if anyone is asleep.
    pub fn min_time_to_wake(&self) -> Option<i64> {
        self.bunks.iter().map(|b| b.time_to_wake).min()
    }

    /// Advance every countdown by one heartbeat and hand each due sleeper to
    /// `on_due`.
    ///
    /// One-shot sleepers are swap-removed and the same index is examined again,
    /// since it now holds the former topmost sleeper. Repeating sleepers get
    /// their interval added back, keeping any overshoot so the long-run period
    /// does not drift with the heartbeat granularity.
    ///
    /// Returns the number of sleepers found due.
    pub fn sweep<F>(&mut self, heartbeat_ms: i64, mut on_due: F) -> usize
    where
        F: FnMut(&SharedSleeper, WakeMode),
    {
        let mut due = 0;
        let mut i = 0;
        while i < self.bunks.len() {
            let bunk = &mut self.bunks[i];
            bunk.time_to_wake -= heartbeat_ms;
            if !bunk.is_due() {
                i += 1;
                continue;
            }

            due += 1;
            on_due(&bunk.sleeper, bunk.mode);

            if bunk.delay.is_repeating() {
                bunk.time_to_wake += i64::from(bunk.delay.magnitude_ms());
                i += 1;
            } else {
                self.bunks.swap_remove(i);
            }
        }
        due
    }

    /// Evict every sleeper.
    pub fn clear(&mut self) {
        self.bunks.clear();
    }
}
