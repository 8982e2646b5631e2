//! Tests for builder modules

use std::time::Duration;

use wakeup_scheduler::builders::wakeup_builder::{build_simulated, build_wakeup};
use wakeup_scheduler::config::BoardConfig;
use wakeup_scheduler::core::{Delay, WakeMode, WakeupError};
use wakeup_scheduler::infra::timer::SimulatedTimer;

#[test]
fn test_build_simulated_is_initialized() {
    let wakeup = build_simulated(&BoardConfig::default()).unwrap();
    assert!(wakeup.is_initialized());
    assert!(wakeup.timer().is_armed());
    assert!(!wakeup.timer().is_running());
    assert_eq!(wakeup.free_slots(), 32);
    assert!(wakeup
        .wake_me_after(|| {}, Delay::Once(10), WakeMode::Deferred)
        .is_ok());
}

#[test]
fn test_build_rejects_invalid_config() {
    let mut cfg = BoardConfig::default();
    cfg.wakeup.max_pending = 1;
    let err = build_simulated(&cfg).err().unwrap();
    assert!(matches!(err, WakeupError::InvalidConfig(_)));
}

#[test]
fn test_build_uses_configured_clock() {
    let mut cfg = BoardConfig::default();
    cfg.timer.cpu_hz = 8_000_000;
    let wakeup = build_simulated(&cfg).unwrap();
    wakeup
        .wake_me_after(|| {}, Delay::Once(10), WakeMode::Deferred)
        .unwrap();
    wakeup.timer().advance(Duration::from_millis(10));
    assert_eq!(wakeup.pending_deferred(), 1);
}

#[test]
fn test_build_propagates_factory_error() {
    let result = build_wakeup::<SimulatedTimer, _>(&BoardConfig::default(), |_| {
        Err(WakeupError::InvalidConfig("no timer".to_string()))
    });
    assert_eq!(
        result.err(),
        Some(WakeupError::InvalidConfig("no timer".to_string()))
    );
}
