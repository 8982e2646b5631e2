//! Infrastructure adapters: the timer sources that drive the scheduler.

pub mod timer;
