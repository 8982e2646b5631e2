//! Tests for error types

use wakeup_scheduler::core::{AppResult, WakeupError};

#[test]
fn test_invalid_delay_error() {
    let err = WakeupError::InvalidDelay;
    assert_eq!(
        format!("{}", err),
        "invalid delay: magnitude must be greater than zero"
    );
}

#[test]
fn test_capacity_exceeded_error() {
    let err = WakeupError::CapacityExceeded { capacity: 32 };
    assert_eq!(format!("{}", err), "capacity exceeded: all 32 bunks occupied");
}

#[test]
fn test_not_initialized_error() {
    let err = WakeupError::NotInitialized;
    assert_eq!(format!("{}", err), "scheduler not initialized");
}

#[test]
fn test_invalid_config_error() {
    let err = WakeupError::InvalidConfig("max_sleepers must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: max_sleepers must be greater than 0"
    );
}

#[test]
fn test_app_result_wraps_wakeup_error() {
    fn admit() -> AppResult<()> {
        let refused: Result<(), WakeupError> = Err(WakeupError::NotInitialized);
        refused?;
        Ok(())
    }
    let err = admit().unwrap_err();
    assert_eq!(
        err.downcast_ref::<WakeupError>(),
        Some(&WakeupError::NotInitialized)
    );
}
