//! Core scheduling: sleeper table, pending set, and the tick handler.

pub mod error;
pub mod pending;
pub mod scheduler;
pub mod sleeper;
pub mod table;

pub use error::{AppResult, WakeupError};
pub use pending::PendingSet;
pub use scheduler::{Wakeup, WakeupStats};
pub use sleeper::{Bunk, Delay, SharedSleeper, Sleeper, WakeMode};
pub use table::SleeperTable;
