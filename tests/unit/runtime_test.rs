//! Tests for runtime adapters

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wakeup_scheduler::builders::wakeup_builder::build_simulated;
use wakeup_scheduler::config::BoardConfig;
use wakeup_scheduler::core::{Delay, WakeMode};
use wakeup_scheduler::infra::timer::TimerSource;
use wakeup_scheduler::runtime::{interrupt_binding, spawn_poller};

#[test]
fn test_binding_drives_tick_handler() {
    let wakeup = build_simulated(&BoardConfig::default()).unwrap();
    wakeup
        .wake_me_after(|| {}, Delay::Every(10), WakeMode::Deferred)
        .unwrap();

    let isr = interrupt_binding(&wakeup);
    isr(wakeup.timer().generation());
    isr(wakeup.timer().generation());
    assert_eq!(wakeup.stats().ticks, 2);
    // Repeating, so it woke on both ticks and is still in its bunk.
    assert_eq!(wakeup.pending_deferred(), 2);
    assert_eq!(wakeup.active_sleepers(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_poller_runs_deferred_sleepers() {
    let wakeup = build_simulated(&BoardConfig::default()).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    for ms in [5, 10, 15] {
        let hits = Arc::clone(&hits);
        wakeup
            .wake_me_after(
                move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                },
                Delay::Once(ms),
                WakeMode::Deferred,
            )
            .unwrap();
    }
    wakeup.timer().advance(Duration::from_millis(20));

    let poller = spawn_poller(Arc::clone(&wakeup), Duration::from_millis(2));
    tokio::time::timeout(Duration::from_secs(2), async {
        while hits.load(Ordering::SeqCst) < 3 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("poller drained sleepers");
    poller.stop().await;

    assert_eq!(wakeup.stats().fired_deferred, 3);
}
