//! Critical sections
//!
//! State shared between main-line code and the timer interrupt lives inside a
//! [`Critical`] cell. Entering the cell yields a [`CriticalSection`] guard which
//! stands in for "interrupts masked": the tick handler cannot touch the state
//! while the guard is alive, and the prior state is restored when the guard is
//! dropped, on every exit path including early returns and `?`.
//!
//! The guard is built on `parking_lot`'s mutex, so there is no poisoning if a
//! callback panics elsewhere.
//!
//! # Examples
//!
//! ```
//! use wakeup_scheduler::Critical;
//!
//! let shared = Critical::new(0_u32);
//! {
//!     let mut cs = shared.enter();
//!     *cs += 1;
//! } // unmasked here
//! assert_eq!(*shared.enter(), 1);
//! ```
//!
//! Sections must not nest on the same cell: keep them to a snapshot-then-release
//! span and never invoke a sleeper while holding one.

use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};

/// A cell whose contents may only be touched inside a critical section.
#[derive(Debug, Default)]
pub struct Critical<T> {
    inner: Mutex<T>,
}

/// Scoped guard for an active critical section.
///
/// Dropping the guard ends the section.
#[must_use = "the critical section ends as soon as the guard is dropped"]
pub struct CriticalSection<'a, T> {
    guard: MutexGuard<'a, T>,
}

impl<T> Critical<T> {
    /// Wrap `value` so that it is only reachable through critical sections.
    #[inline]
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Enter a critical section, blocking while another one is active.
    #[inline]
    pub fn enter(&self) -> CriticalSection<'_, T> {
        CriticalSection {
            guard: self.inner.lock(),
        }
    }

    #[cfg(test)]
    fn is_masked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<T> Deref for CriticalSection<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for CriticalSection<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
