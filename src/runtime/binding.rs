//! Interrupt binding.
//!
//! The timer source only knows how to call a bare `Fn()`. This adapter forwards
//! that call to a particular scheduler instance, holding it weakly so the timer
//! never keeps a dropped scheduler alive.

use std::sync::Arc;

use crate::core::Wakeup;
use crate::infra::timer::{TimerInterrupt, TimerSource};

/// Build the overflow callback that runs `wakeup`'s tick handler.
pub fn interrupt_binding<T>(wakeup: &Arc<Wakeup<T>>) -> TimerInterrupt
where
    T: TimerSource + 'static,
{
    let wakeup = Arc::downgrade(wakeup);
    Arc::new(move |generation| {
        if let Some(wakeup) = wakeup.upgrade() {
            wakeup.on_tick(generation);
        }
    })
}
