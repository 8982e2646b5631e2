//! Configuration models for the scheduler and its timer.

pub mod wakeup;

pub use wakeup::{BoardConfig, TimerConfig, WakeupConfig, ENV_PREFIX, MIN_HEARTBEAT_US};
