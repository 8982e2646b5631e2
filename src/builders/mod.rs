//! Builders to construct a scheduler from configuration.

pub mod wakeup_builder;

pub use wakeup_builder::{build_simulated, build_threaded, build_wakeup};
