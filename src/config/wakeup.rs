//! Scheduler and timer configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::infra::timer::PeriodSetting;

/// Environment variable prefix read by [`BoardConfig::from_env`].
pub const ENV_PREFIX: &str = "WAKEUP_";

/// Shortest heartbeat the scheduler programs, in microseconds.
pub const MIN_HEARTBEAT_US: u64 = 1_000;

/// Capacities and calibration for the wake scheduler.
///
/// All values are fixed once the scheduler is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeupConfig {
    /// Bunks in the sleeper table. 16-32 is generally enough.
    pub max_sleepers: usize,
    /// Entries shared by the deferred queue and the immediate scratch area.
    /// Must hold every sleeper that can wake in one tick.
    pub max_pending: usize,
    /// Longest heartbeat in milliseconds.
    pub max_heartbeat_ms: u32,
    /// Microseconds shaved off the heartbeat per active sleeper to account for
    /// the time the tick handler itself takes.
    pub overhead_per_sleeper_us: u32,
}

impl Default for WakeupConfig {
    fn default() -> Self {
        Self {
            max_sleepers: 32,
            max_pending: 32,
            // Rounded down from the 8,388,480us a 16 MHz clock can count.
            max_heartbeat_ms: 8_350,
            // Calibrated at 10ms with 8 sleepers.
            overhead_per_sleeper_us: 8,
        }
    }
}

/// Clock driving the timer source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// CPU clock frequency in Hz.
    pub cpu_hz: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self { cpu_hz: 16_000_000 }
    }
}

/// Root configuration: scheduler plus timer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Scheduler capacities.
    pub wakeup: WakeupConfig,
    /// Timer clock.
    pub timer: TimerConfig,
}

impl WakeupConfig {
    /// Validate capacities.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sleepers == 0 {
            return Err("max_sleepers must be greater than 0".into());
        }
        if self.max_pending < self.max_sleepers {
            return Err(format!(
                "max_pending ({}) must be at least max_sleepers ({})",
                self.max_pending, self.max_sleepers
            ));
        }
        if self.max_heartbeat_ms == 0 {
            return Err("max_heartbeat_ms must be greater than 0".into());
        }
        // The heartbeat can shrink to 1ms; overhead must leave some of it.
        let full_overhead = u64::from(self.overhead_per_sleeper_us) * self.max_sleepers as u64;
        if full_overhead >= MIN_HEARTBEAT_US {
            return Err(format!(
                "overhead for a full table ({full_overhead}us) must stay below the \
                 {MIN_HEARTBEAT_US}us minimum heartbeat"
            ));
        }
        Ok(())
    }

    /// Longest heartbeat as a duration.
    #[must_use]
    pub fn max_heartbeat(&self) -> Duration {
        Duration::from_millis(u64::from(self.max_heartbeat_ms))
    }
}

impl TimerConfig {
    /// Validate the clock.
    pub fn validate(&self) -> Result<(), String> {
        if self.cpu_hz < 2_000_000 {
            return Err("cpu_hz must be at least 2 MHz".into());
        }
        Ok(())
    }

    /// Longest period a prescaled 16-bit counter can represent at this clock.
    #[must_use]
    pub fn max_period(&self) -> Duration {
        PeriodSetting::maximum().period(self.cpu_hz)
    }
}

impl BoardConfig {
    /// Validate both halves and check the heartbeat fits the timer.
    pub fn validate(&self) -> Result<(), String> {
        self.wakeup
            .validate()
            .map_err(|e| format!("wakeup config invalid: {e}"))?;
        self.timer
            .validate()
            .map_err(|e| format!("timer config invalid: {e}"))?;
        if self.wakeup.max_heartbeat() > self.timer.max_period() {
            return Err(format!(
                "max_heartbeat_ms {} exceeds the timer maximum of {:?}",
                self.wakeup.max_heartbeat_ms,
                self.timer.max_period()
            ));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `WAKEUP_*` environment variables, loading a
    /// `.env` file first if one exists. Unset variables keep their defaults.
    ///
    /// Recognized: `WAKEUP_MAX_SLEEPERS`, `WAKEUP_MAX_PENDING`,
    /// `WAKEUP_MAX_HEARTBEAT_MS`, `WAKEUP_OVERHEAD_PER_SLEEPER_US`,
    /// `WAKEUP_CPU_HZ`.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the same names
    /// as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(
            lookup: &dyn Fn(&str) -> Option<String>,
            name: &str,
            slot: &mut T,
        ) -> Result<(), String> {
            let key = format!("{ENV_PREFIX}{name}");
            if let Some(raw) = lookup(&key) {
                *slot = raw
                    .trim()
                    .parse()
                    .map_err(|_| format!("{key}: cannot parse `{raw}`"))?;
            }
            Ok(())
        }

        let mut cfg = Self::default();
        parse(&lookup, "MAX_SLEEPERS", &mut cfg.wakeup.max_sleepers)?;
        parse(&lookup, "MAX_PENDING", &mut cfg.wakeup.max_pending)?;
        parse(&lookup, "MAX_HEARTBEAT_MS", &mut cfg.wakeup.max_heartbeat_ms)?;
        parse(
            &lookup,
            "OVERHEAD_PER_SLEEPER_US",
            &mut cfg.wakeup.overhead_per_sleeper_us,
        )?;
        parse(&lookup, "CPU_HZ", &mut cfg.timer.cpu_hz)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
