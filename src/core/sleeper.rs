//! Sleepers, delays, and the bunk that holds an active wake request.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A callback woken by the scheduler.
///
/// Any `Fn() + Send + Sync` closure is a sleeper; whatever context it needs is
/// captured by the closure and stays alive for as long as the request does.
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use wakeup_scheduler::core::Sleeper;
///
/// let hits = Arc::new(AtomicU32::new(0));
/// let sleeper = {
///     let hits = Arc::clone(&hits);
///     move || {
///         hits.fetch_add(1, Ordering::Relaxed);
///     }
/// };
/// sleeper.wake();
/// assert_eq!(hits.load(Ordering::Relaxed), 1);
/// ```
pub trait Sleeper: Send + Sync {
    /// Run the callback.
    fn wake(&self);
}

impl<F> Sleeper for F
where
    F: Fn() + Send + Sync,
{
    fn wake(&self) {
        self();
    }
}

/// Shared handle to a sleeper; cloned into the pending set each time it is due.
pub type SharedSleeper = Arc<dyn Sleeper>;

/// Where a due sleeper runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeMode {
    /// Run synchronously inside the tick interrupt. Keep it short.
    Immediate,
    /// Queue for the next `run_any_pending()` call from the main loop.
    Deferred,
}

/// Requested delay in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delay {
    /// Fire once after this many milliseconds, then free the bunk.
    Once(u32),
    /// Fire every this many milliseconds until the scheduler is reset.
    Every(u32),
}

impl Delay {
    /// Interpret a signed millisecond count: positive is one-shot, negative
    /// repeats with the magnitude as the interval.
    ///
    /// Magnitudes beyond `u32::MAX` saturate.
    #[must_use]
    pub fn from_signed_ms(ms: i64) -> Self {
        let magnitude = u32::try_from(ms.unsigned_abs()).unwrap_or(u32::MAX);
        if ms < 0 {
            Self::Every(magnitude)
        } else {
            Self::Once(magnitude)
        }
    }

    /// The delay or repeat interval in milliseconds.
    #[must_use]
    pub const fn magnitude_ms(self) -> u32 {
        match self {
            Self::Once(ms) | Self::Every(ms) => ms,
        }
    }

    /// Whether the request re-arms after firing.
    #[must_use]
    pub const fn is_repeating(self) -> bool {
        matches!(self, Self::Every(_))
    }
}

impl From<i64> for Delay {
    fn from(ms: i64) -> Self {
        Self::from_signed_ms(ms)
    }
}

/// One occupied slot of the sleeper table.
#[derive(Clone)]
pub struct Bunk {
    /// The sleeper to wake.
    pub sleeper: SharedSleeper,
    /// Execution policy once due.
    pub mode: WakeMode,
    /// Delay as requested at admission.
    pub delay: Delay,
    /// Milliseconds left until due; due once this drops to zero or below.
    pub time_to_wake: i64,
}

impl Bunk {
    /// Create a freshly admitted bunk counting down from the full delay.
    pub fn new(sleeper: SharedSleeper, delay: Delay, mode: WakeMode) -> Self {
        Self {
            sleeper,
            mode,
            delay,
            time_to_wake: i64::from(delay.magnitude_ms()),
        }
    }

    /// Whether the countdown has finished.
    #[must_use]
    pub const fn is_due(&self) -> bool {
        self.time_to_wake <= 0
    }
}

impl fmt::Debug for Bunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bunk")
            .field("mode", &self.mode)
            .field("delay", &self.delay)
            .field("time_to_wake", &self.time_to_wake)
            .finish_non_exhaustive()
    }
}
