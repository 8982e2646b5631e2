//! The wake scheduler.
//!
//! [`Wakeup`] owns the sleeper table, the pending set and the one timer source.
//! Main-line code admits sleepers with [`Wakeup::wake_me_after`] and drains
//! deferred ones with [`Wakeup::run_any_pending`]; the timer interrupt drives
//! [`Wakeup::on_tick`] through the adapter in [`crate::runtime::binding`].
//!
//! Every touch of shared state happens inside a [`CriticalSection`] that is
//! released before any sleeper runs, so sleepers may admit new sleepers.
//!
//! [`CriticalSection`]: crate::CriticalSection

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::config::WakeupConfig;
use crate::core::pending::PendingSet;
use crate::core::sleeper::{Bunk, Delay, WakeMode};
use crate::core::table::SleeperTable;
use crate::core::{SharedSleeper, Sleeper, WakeupError};
use crate::critical::Critical;
use crate::infra::timer::{TimerInterrupt, TimerSource};
use crate::runtime::binding::interrupt_binding;

/// Point-in-time view of scheduler activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WakeupStats {
    /// Sleepers currently in the table.
    pub active_sleepers: usize,
    /// Bunks still free.
    pub free_slots: usize,
    /// Deferred sleepers waiting for `run_any_pending()`.
    pub pending_deferred: usize,
    /// Current heartbeat in milliseconds; zero while stopped.
    pub heartbeat_ms: u32,
    /// Tick interrupts handled.
    pub ticks: u64,
    /// Immediate sleepers run from the interrupt.
    pub fired_immediate: u64,
    /// Deferred sleepers run from the main loop.
    pub fired_deferred: u64,
    /// Admissions refused.
    pub rejected: u64,
    /// Due sleepers lost because the pending set was full.
    pub overflowed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    fired_immediate: AtomicU64,
    fired_deferred: AtomicU64,
    rejected: AtomicU64,
    overflowed: AtomicU64,
}

impl Counters {
    fn reset(&self) {
        for counter in [
            &self.ticks,
            &self.fired_immediate,
            &self.fired_deferred,
            &self.rejected,
            &self.overflowed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// State shared with the tick interrupt.
#[derive(Debug)]
struct State {
    table: SleeperTable,
    pending: PendingSet,
    /// Milliseconds the timer was last programmed for; zero while stopped.
    heartbeat_ms: u32,
    /// Timer generation of the last restart. Overflows raised under an older
    /// generation have already been accounted for by normalization.
    generation: u64,
}

/// Marks the immediate phase of a tick. Cleared on drop, even if a sleeper
/// panics.
struct InterruptContext<'a>(&'a AtomicBool);

impl<'a> InterruptContext<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InterruptContext<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Interrupt-driven wake scheduler.
///
/// Construct with [`Wakeup::new`], bind the timer with [`Wakeup::init`], then
/// admit sleepers. The scheduler is shared as an `Arc` between the main loop
/// and the interrupt binding.
pub struct Wakeup<T: TimerSource> {
    config: WakeupConfig,
    timer: T,
    state: Critical<State>,
    in_interrupt: AtomicBool,
    isr: OnceLock<TimerInterrupt>,
    counters: Counters,
}

impl<T: TimerSource> Wakeup<T> {
    /// Create a scheduler that will drive `timer`.
    ///
    /// Fails if the configuration is invalid or asks for a heartbeat longer
    /// than the timer can count.
    pub fn new(config: WakeupConfig, timer: T) -> Result<Arc<Self>, WakeupError> {
        config.validate().map_err(WakeupError::InvalidConfig)?;
        if config.max_heartbeat() > timer.max_period() {
            return Err(WakeupError::InvalidConfig(format!(
                "max_heartbeat_ms {} exceeds the timer maximum of {:?}",
                config.max_heartbeat_ms,
                timer.max_period()
            )));
        }

        Ok(Arc::new(Self {
            state: Critical::new(State {
                table: SleeperTable::with_capacity(config.max_sleepers),
                pending: PendingSet::with_capacity(config.max_pending),
                heartbeat_ms: 0,
                generation: 0,
            }),
            config,
            timer,
            in_interrupt: AtomicBool::new(false),
            isr: OnceLock::new(),
            counters: Counters::default(),
        }))
    }

    /// Ask for `sleeper` to be woken after `delay`.
    ///
    /// The sleeper's captured context must stay valid for as long as the
    /// request is active, which for [`Delay::Every`] means until the scheduler
    /// is re-initialized.
    ///
    /// # Errors
    ///
    /// [`WakeupError::InvalidDelay`] for a zero delay,
    /// [`WakeupError::CapacityExceeded`] when every bunk is taken and
    /// [`WakeupError::NotInitialized`] before [`init`](Self::init). The table
    /// is unchanged on error.
    pub fn wake_me_after<S>(&self, sleeper: S, delay: Delay, mode: WakeMode) -> Result<(), WakeupError>
    where
        S: Sleeper + 'static,
    {
        self.wake_shared(Arc::new(sleeper), delay, mode)
    }

    /// Like [`wake_me_after`](Self::wake_me_after) for a sleeper that is
    /// already shared, e.g. one callback used by several requests.
    pub fn wake_shared(
        &self,
        sleeper: SharedSleeper,
        delay: Delay,
        mode: WakeMode,
    ) -> Result<(), WakeupError> {
        let result = self.admit(sleeper, delay, mode);
        if let Err(e) = &result {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(?delay, ?mode, error = %e, "sleeper rejected");
        }
        result
    }

    /// Signed-millisecond form: positive `ms` is one-shot, negative repeats
    /// every `|ms|`. Returns `false` if the sleeper was not admitted.
    pub fn wake_me_after_ms<S>(&self, sleeper: S, ms: i64, mode: WakeMode) -> bool
    where
        S: Sleeper + 'static,
    {
        self.wake_me_after(sleeper, Delay::from_signed_ms(ms), mode)
            .is_ok()
    }

    fn admit(&self, sleeper: SharedSleeper, delay: Delay, mode: WakeMode) -> Result<(), WakeupError> {
        if delay.magnitude_ms() == 0 {
            return Err(WakeupError::InvalidDelay);
        }
        if self.isr.get().is_none() {
            return Err(WakeupError::NotInitialized);
        }

        let mut state = self.state.enter();
        if state.table.free_slots() == 0 {
            return Err(WakeupError::CapacityExceeded {
                capacity: state.table.capacity(),
            });
        }

        // Bring everyone onto the same origin as the newcomer.
        if !state.table.is_empty() {
            let elapsed = i64::try_from(self.timer.read().as_millis()).unwrap_or(i64::MAX);
            state.table.normalize(elapsed);
        }

        state.table.admit(Bunk::new(sleeper, delay, mode))?;
        self.start_heartbeat(&mut state);

        debug!(
            ?delay,
            ?mode,
            active = state.table.len(),
            heartbeat_ms = state.heartbeat_ms,
            "sleeper admitted"
        );
        Ok(())
    }

    /// Run every deferred sleeper that has woken, oldest first.
    ///
    /// Each entry is taken inside a short critical section and run outside it,
    /// so a slow sleeper never holds off the interrupt. Called from an immediate
    /// sleeper, this does nothing.
    ///
    /// Returns the number of sleepers run.
    pub fn run_any_pending(&self) -> usize {
        if self.in_interrupt.load(Ordering::Acquire) {
            trace!("run_any_pending ignored inside interrupt context");
            return 0;
        }

        let mut ran = 0;
        loop {
            // New sleepers may wake while earlier ones run.
            let next = self.state.enter().pending.pop_deferred();
            let Some(sleeper) = next else {
                break;
            };
            sleeper.wake();
            ran += 1;
        }

        if ran > 0 {
            self.counters
                .fired_deferred
                .fetch_add(ran as u64, Ordering::Relaxed);
            trace!(ran, "deferred sleepers run");
        }
        ran
    }

    /// Tick handler, invoked on every timer overflow with the timer generation
    /// the overflow was raised under.
    ///
    /// Takes one heartbeat off every countdown, moves due sleepers into the
    /// pending set, reprograms the heartbeat, and only then runs the immediate
    /// sleepers, so none of them sees a half-updated table.
    ///
    /// A tick raised before the timer's last restart is discarded: whoever
    /// restarted it already reprogrammed the heartbeat, and counting the stale
    /// tick would charge the new heartbeat for time that never passed.
    pub fn on_tick(&self, generation: u64) {
        let immediate = {
            let mut guard = self.state.enter();
            let state = &mut *guard;
            if state.heartbeat_ms == 0 {
                trace!("spurious tick with no heartbeat programmed");
                return;
            }
            if generation != state.generation {
                debug!(
                    generation,
                    current = state.generation,
                    "stale tick discarded"
                );
                return;
            }

            let heartbeat = i64::from(state.heartbeat_ms);
            let pending = &mut state.pending;
            let mut dropped = 0_u64;
            let due = state.table.sweep(heartbeat, |sleeper, mode| {
                if !pending.push(Arc::clone(sleeper), mode) {
                    dropped += 1;
                }
            });

            self.counters.ticks.fetch_add(1, Ordering::Relaxed);
            if dropped > 0 {
                self.counters.overflowed.fetch_add(dropped, Ordering::Relaxed);
                error!(
                    dropped,
                    capacity = state.pending.capacity(),
                    "pending set full, due sleepers dropped"
                );
            }

            self.start_heartbeat(state);
            trace!(
                due,
                active = state.table.len(),
                heartbeat_ms = state.heartbeat_ms,
                "tick"
            );
            state.pending.take_immediate()
        };

        if immediate.is_empty() {
            return;
        }
        {
            let _context = InterruptContext::enter(&self.in_interrupt);
            for sleeper in &immediate {
                sleeper.wake();
            }
        }
        self.counters
            .fired_immediate
            .fetch_add(immediate.len() as u64, Ordering::Relaxed);
    }

    /// Program the timer for the soonest wake, or stop it if nobody is asleep.
    fn start_heartbeat(&self, state: &mut State) {
        let Some(soonest) = state.table.min_time_to_wake() else {
            state.heartbeat_ms = 0;
            self.timer.stop();
            trace!("no sleepers, heartbeat stopped");
            return;
        };

        let heartbeat = soonest.clamp(1, i64::from(self.config.max_heartbeat_ms));
        state.heartbeat_ms = u32::try_from(heartbeat).unwrap_or(self.config.max_heartbeat_ms);

        let overhead = Duration::from_micros(
            u64::from(self.config.overhead_per_sleeper_us) * state.table.len() as u64,
        );
        let period = Duration::from_millis(u64::from(state.heartbeat_ms))
            .saturating_sub(overhead)
            .max(Duration::from_micros(1));

        self.timer.set_period(period);
        self.timer.start();
        state.generation = self.timer.generation();
    }

    /// Bunks still available.
    pub fn free_slots(&self) -> usize {
        self.state.enter().table.free_slots()
    }

    /// Sleepers currently waiting.
    pub fn active_sleepers(&self) -> usize {
        self.state.enter().table.len()
    }

    /// Deferred sleepers woken but not yet run.
    pub fn pending_deferred(&self) -> usize {
        self.state.enter().pending.deferred_len()
    }

    /// Current heartbeat, or `None` while the timer is stopped.
    pub fn heartbeat(&self) -> Option<Duration> {
        let ms = self.state.enter().heartbeat_ms;
        (ms > 0).then(|| Duration::from_millis(u64::from(ms)))
    }

    /// Whether [`init`](Self::init) has bound the timer interrupt.
    pub fn is_initialized(&self) -> bool {
        self.isr.get().is_some()
    }

    /// Snapshot of counters and occupancy.
    pub fn stats(&self) -> WakeupStats {
        let (active_sleepers, free_slots, pending_deferred, heartbeat_ms) = {
            let state = self.state.enter();
            (
                state.table.len(),
                state.table.free_slots(),
                state.pending.deferred_len(),
                state.heartbeat_ms,
            )
        };
        WakeupStats {
            active_sleepers,
            free_slots,
            pending_deferred,
            heartbeat_ms,
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            fired_immediate: self.counters.fired_immediate.load(Ordering::Relaxed),
            fired_deferred: self.counters.fired_deferred.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            overflowed: self.counters.overflowed.load(Ordering::Relaxed),
        }
    }

    /// The timer source this scheduler drives.
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    /// Configuration the scheduler was built with.
    pub const fn config(&self) -> &WakeupConfig {
        &self.config
    }
}

impl<T: TimerSource + 'static> Wakeup<T> {
    /// Reset every count and bind the timer interrupt to this scheduler.
    ///
    /// Must be called once at startup, before the first admission. Calling it
    /// again evicts every sleeper, repeating ones included, and drops anything
    /// still pending.
    pub fn init(self: &Arc<Self>) {
        let isr = self.isr.get_or_init(|| interrupt_binding(self));
        {
            let mut state = self.state.enter();
            state.table.clear();
            state.pending.clear();
            state.heartbeat_ms = 0;
            self.timer
                .attach_interrupt(Arc::clone(isr), self.config.max_heartbeat());
            self.timer.stop();
        }
        self.in_interrupt.store(false, Ordering::Release);
        self.counters.reset();
        info!(
            max_sleepers = self.config.max_sleepers,
            max_pending = self.config.max_pending,
            max_heartbeat_ms = self.config.max_heartbeat_ms,
            "wake scheduler initialized"
        );
    }
}

impl<T: TimerSource> Drop for Wakeup<T> {
    fn drop(&mut self) {
        self.timer.stop();
        self.timer.detach_interrupt();
    }
}
