//! # Wakeup Scheduler
//!
//! A cooperative, interrupt-driven wake scheduler. Many independent "sleepers"
//! ask to be called back after a delay, and all of them are multiplexed onto a
//! single periodic timer interrupt, which is the only source of elapsed time.
//!
//! ## Core Problem Solved
//!
//! Small control loops (home automation nodes, sensor hubs, robot firmware) often
//! have exactly one spare hardware timer but dozens of things that need to happen
//! "in 250ms" or "every 2s":
//!
//! - **One Timer, Many Sleepers**: every wake request shares the same alarm
//! - **Few Wasted Interrupts**: the timer period (the *heartbeat*) is recomputed
//!   after every admission and every tick so the alarm lands on the next wake
//! - **Interrupt vs. Main-Line Safety**: bookkeeping is only touched inside
//!   scoped critical sections
//! - **Two Execution Policies**: short callbacks run straight from the interrupt,
//!   longer ones are deferred until the main loop polls
//!
//! ## Key Features
//!
//! - **Packed Sleeper Table**: active requests always form a contiguous prefix
//! - **Immediate and Deferred Modes**: see [`core::WakeMode`]
//! - **One-shot and Repeating Delays**: see [`core::Delay`]
//! - **Pluggable Timer Sources**: a cycle-accurate [`infra::timer::SimulatedTimer`]
//!   for deterministic tests and a wall-clock [`infra::timer::ThreadTimer`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use wakeup_scheduler::config::WakeupConfig;
//! use wakeup_scheduler::core::{Delay, WakeMode, Wakeup};
//! use wakeup_scheduler::infra::timer::SimulatedTimer;
//!
//! let wakeup = Wakeup::new(WakeupConfig::default(), SimulatedTimer::default())?;
//! wakeup.init();
//!
//! wakeup.wake_me_after(|| println!("blink"), Delay::Every(500), WakeMode::Immediate)?;
//! wakeup.wake_me_after(|| println!("report"), Delay::Once(2_000), WakeMode::Deferred)?;
//!
//! wakeup.timer().advance(Duration::from_secs(3));
//! wakeup.run_any_pending();
//! ```
//!
//! For complete scenarios, see `tests/wakeup_scenarios_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: sleeper table, pending set, and the tick handler.
pub mod core;
/// Configuration models for the scheduler and its timer.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Timer sources the scheduler can be driven by.
pub mod infra;
/// Runtime adapters: interrupt binding and main-loop pollers.
pub mod runtime;
/// Scoped critical sections guarding state shared with the interrupt.
pub mod critical;
/// Shared utilities.
pub mod util;

pub use critical::{Critical, CriticalSection};
