//! Tokio-driven main-loop poller.
//!
//! Applications that already run a tokio runtime can let a background task
//! call [`Wakeup::run_any_pending`] on a fixed interval instead of polling by
//! hand.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::Wakeup;
use crate::infra::timer::TimerSource;

/// Handle to a running poller task.
pub struct PollerHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for the task to finish its current pass.
    pub async fn stop(self) {
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "poller task ended abnormally");
        }
    }
}

/// Spawn a task on the current runtime that drains deferred sleepers every
/// `every`.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_poller<T>(wakeup: Arc<Wakeup<T>>, every: Duration) -> PollerHandle
where
    T: TimerSource + 'static,
{
    let stop = Arc::new(Notify::new());
    let task = {
        let stop = Arc::clone(&stop);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(?every, "deferred poller started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        wakeup.run_any_pending();
                    }
                    () = stop.notified() => break,
                }
            }
            tracing::debug!("deferred poller stopped");
        })
    };
    PollerHandle { stop, task }
}
