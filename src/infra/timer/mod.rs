//! Timer sources.
//!
//! The scheduler owns exactly one [`TimerSource`] and is the only component
//! allowed to reprogram it. Two implementations ship with the crate:
//!
//! - [`SimulatedTimer`]: a cycle-accurate model of a 16-bit phase-and-frequency
//!   correct counter with a prescaler, advanced explicitly by the caller.
//! - [`ThreadTimer`]: a wall-clock alarm whose overflow callback runs on a
//!   dedicated thread.

pub mod prescaler;
pub mod simulated;
pub mod thread;

use std::sync::Arc;
use std::time::Duration;

pub use prescaler::{ClockSelect, PeriodSetting};
pub use simulated::SimulatedTimer;
pub use thread::ThreadTimer;

/// Overflow callback invoked when the programmed period elapses.
///
/// The argument is the timer's [`generation`](TimerSource::generation) at the
/// moment the overflow was raised, so a handler that runs late can tell that
/// the count has been restarted since.
pub type TimerInterrupt = Arc<dyn Fn(u64) + Send + Sync>;

/// A periodic hardware alarm.
///
/// Methods take `&self`: implementations behave like a register block, with
/// their own interior synchronization, and may be called from inside the
/// overflow callback.
pub trait TimerSource: Send + Sync {
    /// Program the period. Requests the hardware cannot represent are clamped to
    /// [`max_period`](Self::max_period), never rejected, so the programmed period
    /// is never longer than requested. Safe while stopped or running.
    fn set_period(&self, period: Duration);

    /// Reset the count to its near-zero starting value and begin counting.
    /// Bumps the [`generation`](Self::generation), clearing any overflow
    /// raised before the restart.
    fn start(&self);

    /// Number of times [`start`](Self::start) has been called.
    fn generation(&self) -> u64;

    /// Continue counting from the current count.
    fn resume(&self);

    /// Halt counting.
    fn stop(&self);

    /// Time elapsed since the count was last reset.
    fn read(&self) -> Duration;

    /// Program `period` (unless zero, which keeps the current one), arm `isr` as
    /// the single overflow callback, replacing any previous one, and resume.
    fn attach_interrupt(&self, isr: TimerInterrupt, period: Duration);

    /// Disarm the overflow callback. The counter keeps its state.
    fn detach_interrupt(&self);

    /// Longest period the hardware can represent.
    fn max_period(&self) -> Duration;
}
