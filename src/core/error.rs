//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by the wake scheduler.
///
/// None of these are fatal: the caller decides whether to retry with different
/// parameters or drop the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WakeupError {
    /// A delay of zero milliseconds was requested.
    #[error("invalid delay: magnitude must be greater than zero")]
    InvalidDelay,
    /// Every bunk in the sleeper table is occupied.
    #[error("capacity exceeded: all {capacity} bunks occupied")]
    CapacityExceeded {
        /// Size of the sleeper table.
        capacity: usize,
    },
    /// `init()` has not bound the timer interrupt yet.
    #[error("scheduler not initialized")]
    NotInitialized,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
