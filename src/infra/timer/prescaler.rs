//! Period and prescaler selection for a 16-bit phase-and-frequency-correct timer.
//!
//! In this mode the counter climbs from BOTTOM to TOP and back down again, and
//! the overflow interrupt fires at BOTTOM, so one period is `2 * TOP` counter
//! ticks. The prescaler is the smallest divisor that lets the requested period
//! fit the 16-bit TOP register; anything longer than the slowest clock can count
//! is clamped to the maximum.

use std::time::Duration;

/// Number of distinct values the counter can hold.
pub const RESOLUTION: u64 = 65_536;

/// Clock-select bits: which divisor of the CPU clock drives the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSelect {
    /// Full CPU clock.
    Div1,
    /// CPU clock / 8.
    Div8,
    /// CPU clock / 64.
    Div64,
    /// CPU clock / 256.
    Div256,
    /// CPU clock / 1024.
    Div1024,
}

impl ClockSelect {
    /// Every divisor, fastest first, with the shift taking each to the next.
    const LADDER: [(Self, u32); 5] = [
        (Self::Div1, 0),
        (Self::Div8, 3),
        (Self::Div64, 3),
        (Self::Div256, 2),
        (Self::Div1024, 2),
    ];

    /// CPU cycles per counter tick.
    #[must_use]
    pub const fn divisor(self) -> u64 {
        match self {
            Self::Div1 => 1,
            Self::Div8 => 8,
            Self::Div64 => 64,
            Self::Div256 => 256,
            Self::Div1024 => 1024,
        }
    }
}

/// A programmed period: the TOP register plus the clock driving the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSetting {
    /// Value of the TOP register.
    pub top: u16,
    /// Selected prescaler.
    pub clock: ClockSelect,
}

impl PeriodSetting {
    /// Pick the finest prescaler that can represent `period`, clamping requests
    /// that are out of range.
    #[must_use]
    pub fn select(cpu_hz: u32, period: Duration) -> Self {
        let us = u64::try_from(period.as_micros()).unwrap_or(u64::MAX);
        // Up and down again per period, so half the cycles reach TOP.
        let mut cycles = (u64::from(cpu_hz) / 2_000_000).saturating_mul(us);

        for (clock, shift) in ClockSelect::LADDER {
            cycles >>= shift;
            if cycles < RESOLUTION {
                return Self {
                    // A TOP of zero would overflow continuously.
                    top: u16::try_from(cycles).unwrap_or(u16::MAX).max(1),
                    clock,
                };
            }
        }

        tracing::trace!(?period, "period out of range, clamping to maximum");
        Self::maximum()
    }

    /// The slowest clock with TOP at its highest value.
    #[must_use]
    pub const fn maximum() -> Self {
        Self {
            top: u16::MAX,
            clock: ClockSelect::Div1024,
        }
    }

    /// Counter ticks in one full up-and-down period.
    #[must_use]
    pub fn ticks_per_period(self) -> u64 {
        2 * u64::from(self.top)
    }

    /// CPU cycles in one full period.
    #[must_use]
    pub fn cycles_per_period(self) -> u64 {
        self.ticks_per_period() * self.clock.divisor()
    }

    /// The period actually programmed, after quantization.
    #[must_use]
    pub fn period(self, cpu_hz: u32) -> Duration {
        cycles_to_duration(self.cycles_per_period(), cpu_hz)
    }
}

/// Convert CPU cycles to wall time.
#[must_use]
pub fn cycles_to_duration(cycles: u64, cpu_hz: u32) -> Duration {
    let nanos = u128::from(cycles) * 1_000_000_000 / u128::from(cpu_hz.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Convert wall time to CPU cycles, rounding down.
#[must_use]
pub fn duration_to_cycles(duration: Duration, cpu_hz: u32) -> u64 {
    let cycles = duration.as_nanos() * u128::from(cpu_hz) / 1_000_000_000;
    u64::try_from(cycles).unwrap_or(u64::MAX)
}
