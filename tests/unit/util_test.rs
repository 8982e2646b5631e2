//! Tests for utility functions

use wakeup_scheduler::util::{init_tracing, DEFAULT_FILTER};

#[test]
fn test_default_filter_targets_crate() {
    assert!(DEFAULT_FILTER.starts_with("wakeup_scheduler"));
}

#[test]
fn test_init_tracing_twice() {
    init_tracing();
    init_tracing();
}
