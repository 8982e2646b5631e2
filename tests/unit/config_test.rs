//! Tests for configuration validation

use wakeup_scheduler::config::{BoardConfig, TimerConfig, WakeupConfig, MIN_HEARTBEAT_US};
use wakeup_scheduler::core::{Wakeup, WakeupError};
use wakeup_scheduler::infra::timer::SimulatedTimer;

#[test]
fn test_wakeup_config_defaults() {
    let cfg = WakeupConfig::default();
    assert_eq!(cfg.max_sleepers, 32);
    assert_eq!(cfg.max_pending, 32);
    assert_eq!(cfg.max_heartbeat_ms, 8_350);
    assert_eq!(cfg.overhead_per_sleeper_us, 8);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_wakeup_config_invalid_max_sleepers() {
    let invalid = WakeupConfig {
        max_sleepers: 0,
        ..WakeupConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_wakeup_config_pending_smaller_than_table() {
    let invalid = WakeupConfig {
        max_sleepers: 16,
        max_pending: 8,
        ..WakeupConfig::default()
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("max_pending"));
}

#[test]
fn test_wakeup_config_invalid_heartbeat() {
    let invalid = WakeupConfig {
        max_heartbeat_ms: 0,
        ..WakeupConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_wakeup_config_overhead_swallows_heartbeat() {
    // Even with a long maximum, the heartbeat can shrink to 1ms.
    let invalid = WakeupConfig {
        max_sleepers: 4,
        max_pending: 4,
        max_heartbeat_ms: 8_350,
        overhead_per_sleeper_us: 2_000,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_wakeup_config_overhead_boundary() {
    let full_table = |overhead_per_sleeper_us| WakeupConfig {
        max_sleepers: 32,
        max_pending: 32,
        overhead_per_sleeper_us,
        ..WakeupConfig::default()
    };
    // 32 * 31us = 992us fits under a 1ms heartbeat, 32 * 32us = 1024us does not.
    assert!(full_table(31).validate().is_ok());
    assert!(full_table(32).validate().is_err());
    assert_eq!(MIN_HEARTBEAT_US, 1_000);
}

#[test]
fn test_scheduler_refuses_overhead_beyond_shortest_heartbeat() {
    let cfg = WakeupConfig {
        max_sleepers: 4,
        max_pending: 4,
        overhead_per_sleeper_us: 2_000,
        ..WakeupConfig::default()
    };
    let result = Wakeup::new(cfg, SimulatedTimer::default());
    assert!(matches!(result.err(), Some(WakeupError::InvalidConfig(_))));
}

#[test]
fn test_timer_config_validation() {
    assert!(TimerConfig::default().validate().is_ok());
    assert!(TimerConfig { cpu_hz: 1_000_000 }.validate().is_err());
}

#[test]
fn test_timer_max_period_at_16mhz() {
    let max = TimerConfig::default().max_period();
    assert_eq!(max.as_micros(), 8_388_480);
}

#[test]
fn test_board_config_from_json() {
    let json = r#"{
        "wakeup": { "max_sleepers": 8, "max_pending": 16, "max_heartbeat_ms": 1000 },
        "timer": { "cpu_hz": 8000000 }
    }"#;
    let cfg = BoardConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.wakeup.max_sleepers, 8);
    assert_eq!(cfg.wakeup.max_pending, 16);
    assert_eq!(cfg.wakeup.max_heartbeat_ms, 1_000);
    // Omitted fields keep their defaults.
    assert_eq!(cfg.wakeup.overhead_per_sleeper_us, 8);
    assert_eq!(cfg.timer.cpu_hz, 8_000_000);
}

#[test]
fn test_board_config_from_empty_json_is_default() {
    let cfg = BoardConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, BoardConfig::default());
}

#[test]
fn test_board_config_from_json_rejects_invalid() {
    assert!(BoardConfig::from_json_str("not json").is_err());
    assert!(BoardConfig::from_json_str(r#"{ "wakeup": { "max_sleepers": 0 } }"#).is_err());
}

#[test]
fn test_board_config_serde_keeps_values() {
    let mut cfg = BoardConfig::default();
    cfg.wakeup.max_sleepers = 12;
    cfg.timer.cpu_hz = 20_000_000;
    let json = serde_json::to_string(&cfg).unwrap();
    let back: BoardConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}
