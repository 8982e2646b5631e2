//! Software model of a prescaled 16-bit timer.
//!
//! Time only moves when [`SimulatedTimer::advance`] is called, which makes
//! scheduler behavior fully deterministic in tests. Overflow callbacks run on
//! the thread calling `advance`, with the timer's own lock released so they may
//! reprogram the timer.

use std::time::Duration;

use parking_lot::Mutex;

use super::prescaler::{cycles_to_duration, duration_to_cycles, PeriodSetting};
use super::{TimerInterrupt, TimerSource};
use crate::config::TimerConfig;

/// Counter state, the model's equivalent of the register block.
struct Registers {
    setting: PeriodSetting,
    /// Ticks since BOTTOM, folding the up and down halves of the period.
    position: u64,
    /// CPU cycles not yet making up a whole prescaled tick.
    residual: u64,
    running: bool,
    armed: bool,
    isr: Option<TimerInterrupt>,
    /// Total simulated CPU cycles.
    now: u64,
    overflows: u64,
    generation: u64,
}

impl Registers {
    /// Counter register value and direction, as the hardware exposes them.
    fn counter(&self) -> (u64, bool) {
        let top = u64::from(self.setting.top);
        if self.position <= top {
            (self.position, false)
        } else {
            (2 * top - self.position, true)
        }
    }

    /// Cycles until the counter next reaches BOTTOM, if it is running.
    fn cycles_to_overflow(&self) -> Option<u64> {
        if !self.running {
            return None;
        }
        let ticks_left = self.setting.ticks_per_period() - self.position;
        Some(ticks_left * self.setting.clock.divisor() - self.residual)
    }

    fn consume(&mut self, cycles: u64) {
        self.now += cycles;
        if self.running {
            let total = self.residual + cycles;
            let divisor = self.setting.clock.divisor();
            self.position += total / divisor;
            self.residual = total % divisor;
        }
    }
}

/// Deterministic, manually advanced timer source.
pub struct SimulatedTimer {
    cpu_hz: u32,
    regs: Mutex<Registers>,
}

impl SimulatedTimer {
    /// Create a stopped timer clocked at `cpu_hz`, programmed to one second.
    pub fn new(cpu_hz: u32) -> Self {
        Self {
            cpu_hz,
            regs: Mutex::new(Registers {
                setting: PeriodSetting::select(cpu_hz, Duration::from_secs(1)),
                position: 0,
                residual: 0,
                running: false,
                armed: false,
                isr: None,
                now: 0,
                overflows: 0,
                generation: 0,
            }),
        }
    }

    /// Create a timer from configuration.
    pub fn from_config(cfg: &TimerConfig) -> Self {
        Self::new(cfg.cpu_hz)
    }

    /// Let `by` of simulated time pass, firing the overflow callback every time
    /// the counter reaches BOTTOM while armed.
    pub fn advance(&self, by: Duration) {
        let mut budget = duration_to_cycles(by, self.cpu_hz);
        loop {
            let isr = {
                let mut regs = self.regs.lock();
                match regs.cycles_to_overflow() {
                    Some(needed) if needed <= budget => {
                        budget -= needed;
                        regs.now += needed;
                        regs.position = 0;
                        regs.residual = 0;
                        regs.overflows += 1;
                        if regs.armed {
                            regs.isr.clone().map(|isr| (isr, regs.generation))
                        } else {
                            None
                        }
                    }
                    _ => {
                        regs.consume(budget);
                        break;
                    }
                }
            };
            if let Some((isr, generation)) = isr {
                isr(generation);
            }
        }
    }

    /// Total simulated time since creation.
    pub fn now(&self) -> Duration {
        cycles_to_duration(self.regs.lock().now, self.cpu_hz)
    }

    /// Whether the counter is running.
    pub fn is_running(&self) -> bool {
        self.regs.lock().running
    }

    /// Whether an overflow callback is armed.
    pub fn is_armed(&self) -> bool {
        let regs = self.regs.lock();
        regs.armed && regs.isr.is_some()
    }

    /// The period currently programmed, after quantization.
    pub fn period(&self) -> Duration {
        self.regs.lock().setting.period(self.cpu_hz)
    }

    /// Overflows counted so far, armed or not.
    pub fn overflows(&self) -> u64 {
        self.regs.lock().overflows
    }
}

impl Default for SimulatedTimer {
    fn default() -> Self {
        Self::from_config(&TimerConfig::default())
    }
}

impl TimerSource for SimulatedTimer {
    fn set_period(&self, period: Duration) {
        let setting = PeriodSetting::select(self.cpu_hz, period);
        let mut regs = self.regs.lock();
        regs.setting = setting;
        // A shorter TOP may leave the counter past the new period.
        if regs.position >= setting.ticks_per_period() {
            regs.position = 0;
            regs.residual = 0;
        }
    }

    fn start(&self) {
        let mut regs = self.regs.lock();
        // One tick rather than zero; at BOTTOM the overflow flag would be raised
        // straight away.
        regs.position = 1;
        regs.residual = 0;
        regs.running = true;
        regs.generation += 1;
    }

    fn generation(&self) -> u64 {
        self.regs.lock().generation
    }

    fn resume(&self) {
        self.regs.lock().running = true;
    }

    fn stop(&self) {
        self.regs.lock().running = false;
    }

    fn read(&self) -> Duration {
        let (ticks, divisor) = {
            let regs = self.regs.lock();
            let (count, descending) = regs.counter();
            let top = u64::from(regs.setting.top);
            // Counting down: add how far we've come back from TOP.
            let ticks = if descending { 2 * top - count } else { count };
            (ticks, regs.setting.clock.divisor())
        };
        cycles_to_duration(ticks * divisor, self.cpu_hz)
    }

    fn attach_interrupt(&self, isr: TimerInterrupt, period: Duration) {
        if !period.is_zero() {
            self.set_period(period);
        }
        {
            let mut regs = self.regs.lock();
            regs.isr = Some(isr);
            regs.armed = true;
        }
        self.resume();
    }

    fn detach_interrupt(&self) {
        self.regs.lock().armed = false;
    }

    fn max_period(&self) -> Duration {
        PeriodSetting::maximum().period(self.cpu_hz)
    }
}
