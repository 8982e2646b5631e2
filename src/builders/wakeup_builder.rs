//! Builders to construct a scheduler from configuration.

use std::sync::Arc;

use crate::config::{BoardConfig, TimerConfig};
use crate::core::{Wakeup, WakeupError};
use crate::infra::timer::{SimulatedTimer, ThreadTimer, TimerSource};

/// Validate `cfg`, build the timer with `timer_factory`, and return an
/// initialized scheduler driving it.
pub fn build_wakeup<T, F>(cfg: &BoardConfig, timer_factory: F) -> Result<Arc<Wakeup<T>>, WakeupError>
where
    T: TimerSource + 'static,
    F: FnOnce(&TimerConfig) -> Result<T, WakeupError>,
{
    cfg.validate()
        .map_err(|e| WakeupError::InvalidConfig(format!("config invalid: {e}")))?;

    let timer = timer_factory(&cfg.timer)?;
    let wakeup = Wakeup::new(cfg.wakeup.clone(), timer)?;
    wakeup.init();
    Ok(wakeup)
}

/// Scheduler driven by a [`SimulatedTimer`] clocked per `cfg.timer`.
pub fn build_simulated(cfg: &BoardConfig) -> Result<Arc<Wakeup<SimulatedTimer>>, WakeupError> {
    build_wakeup(cfg, |timer| Ok(SimulatedTimer::from_config(timer)))
}

/// Scheduler driven by a wall-clock [`ThreadTimer`] with the same maximum
/// period as the configured hardware clock.
pub fn build_threaded(cfg: &BoardConfig) -> Result<Arc<Wakeup<ThreadTimer>>, WakeupError> {
    build_wakeup(cfg, |timer| {
        ThreadTimer::new(timer.max_period())
            .map_err(|e| WakeupError::InvalidConfig(format!("timer thread: {e}")))
    })
}
