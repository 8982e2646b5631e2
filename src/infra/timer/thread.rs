//! Wall-clock timer source backed by a dedicated OS thread.
//!
//! The alarm thread sleeps on a `Condvar` until either the programmed period
//! elapses or the timer is reprogrammed; there is no polling. The overflow
//! callback runs on the alarm thread, which plays the part of interrupt
//! context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use super::{TimerInterrupt, TimerSource};

/// Count state shared with the alarm thread.
struct Alarm {
    period: Duration,
    /// Count accumulated before the last stop.
    banked: Duration,
    /// When counting last (re)started; `None` while stopped.
    since: Option<Instant>,
    armed: bool,
    isr: Option<TimerInterrupt>,
    generation: u64,
    shutdown: bool,
}

impl Alarm {
    fn elapsed(&self, now: Instant) -> Duration {
        self.banked + self.since.map_or(Duration::ZERO, |t| now.saturating_duration_since(t))
    }
}

struct Shared {
    alarm: Mutex<Alarm>,
    changed: Condvar,
}

/// Real-time periodic alarm.
pub struct ThreadTimer {
    shared: Arc<Shared>,
    max_period: Duration,
    stopped: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadTimer {
    /// Spawn the alarm thread. Periods longer than `max_period` are clamped.
    pub fn new(max_period: Duration) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            alarm: Mutex::new(Alarm {
                period: max_period,
                banked: Duration::ZERO,
                since: None,
                armed: false,
                isr: None,
                generation: 0,
                shutdown: false,
            }),
            changed: Condvar::new(),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("wakeup-timer".into())
                .spawn(move || alarm_loop(&shared))?
        };

        Ok(Self {
            shared,
            max_period,
            stopped: AtomicBool::new(false),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop the alarm thread and wait for it to exit.
    ///
    /// Must not be called from inside the overflow callback.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        {
            let mut alarm = self.shared.alarm.lock();
            alarm.shutdown = true;
        }
        self.shared.changed.notify_all();

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("timer thread panicked");
            }
        }
        info!("timer thread shut down");
    }

    fn update<F: FnOnce(&mut Alarm)>(&self, f: F) {
        {
            let mut alarm = self.shared.alarm.lock();
            f(&mut alarm);
        }
        self.shared.changed.notify_all();
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        // Don't join here: the last handle may be dropped from the callback.
        if !self.stopped.swap(true, Ordering::AcqRel) {
            self.shared.alarm.lock().shutdown = true;
            self.shared.changed.notify_all();
            debug!("timer dropped without explicit shutdown, thread detached");
        }
    }
}

impl TimerSource for ThreadTimer {
    fn set_period(&self, period: Duration) {
        let period = period.clamp(Duration::from_micros(1), self.max_period);
        self.update(|alarm| alarm.period = period);
    }

    fn start(&self) {
        self.update(|alarm| {
            alarm.banked = Duration::ZERO;
            alarm.since = Some(Instant::now());
            alarm.generation += 1;
        });
    }

    fn generation(&self) -> u64 {
        self.shared.alarm.lock().generation
    }

    fn resume(&self) {
        self.update(|alarm| {
            if alarm.since.is_none() {
                alarm.since = Some(Instant::now());
            }
        });
    }

    fn stop(&self) {
        self.update(|alarm| {
            let now = Instant::now();
            alarm.banked = alarm.elapsed(now);
            alarm.since = None;
        });
    }

    fn read(&self) -> Duration {
        self.shared.alarm.lock().elapsed(Instant::now())
    }

    fn attach_interrupt(&self, isr: TimerInterrupt, period: Duration) {
        if !period.is_zero() {
            self.set_period(period);
        }
        self.update(|alarm| {
            alarm.isr = Some(isr);
            alarm.armed = true;
        });
        self.resume();
    }

    fn detach_interrupt(&self) {
        self.update(|alarm| alarm.armed = false);
    }

    fn max_period(&self) -> Duration {
        self.max_period
    }
}

fn alarm_loop(shared: &Shared) {
    debug!("timer thread started");
    let mut alarm = shared.alarm.lock();
    loop {
        if alarm.shutdown {
            break;
        }
        if alarm.since.is_none() {
            shared.changed.wait(&mut alarm);
            continue;
        }

        let now = Instant::now();
        let elapsed = alarm.elapsed(now);
        if elapsed < alarm.period {
            let remaining = alarm.period - elapsed;
            shared.changed.wait_for(&mut alarm, remaining);
            continue;
        }

        // Overflow: the count restarts and the callback runs unlocked so it may
        // reprogram the timer.
        alarm.banked = Duration::ZERO;
        alarm.since = Some(now);
        let isr = if alarm.armed {
            alarm.isr.clone().map(|isr| (isr, alarm.generation))
        } else {
            None
        };
        if let Some((isr, generation)) = isr {
            drop(alarm);
            isr(generation);
            alarm = shared.alarm.lock();
        }
    }
    debug!("timer thread exiting");
}
