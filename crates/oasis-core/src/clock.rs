//! Virtual time source for the simulation.
//!
//! Two modes: a monotonic integer tick counter (Twitter
//! mode) advanced explicitly by the [`crate::env::EnvironmentDriver`], or a
//! scaled real-time clock (Reddit mode) that maps wall-clock elapsed time to
//! virtual elapsed time through a scale factor `k`.

use std::time::Instant;

/// Virtual time source embedded in the [`crate::platform::Platform`].
///
/// Every handler that records a mutation stamps the row by calling
/// [`Clock::now`].
#[derive(Debug, Clone)]
pub enum Clock {
    /// Integer tick counter, advanced once per timestep.
    Tick {
        /// Current tick value.
        time_step: i64,
    },
    /// Real-time clock scaled by a factor `k` against a fixed start instant.
    Scaled {
        /// Virtual instant corresponding to `start_real`.
        start_virtual: chrono::DateTime<chrono::Utc>,
        /// Real instant the scaled clock was created.
        start_real: Instant,
        /// Scale factor: one real second is `k` virtual seconds.
        k: f64,
    },
}

impl Clock {
    /// Construct a tick-mode clock starting at tick 0.
    pub fn new_tick() -> Self {
        Clock::Tick { time_step: 0 }
    }

    /// Construct a scaled-mode clock starting "now" with scale factor `k`.
    pub fn new_scaled(k: f64) -> Self {
        Clock::Scaled {
            start_virtual: chrono::Utc::now(),
            start_real: Instant::now(),
            k,
        }
    }

    /// Return the current virtual time as an opaque string.
    ///
    /// Tick mode returns the decimal tick value; scaled mode returns an
    /// ISO-8601 datetime.
    pub fn now(&self) -> String {
        match self {
            Clock::Tick { time_step } => time_step.to_string(),
            Clock::Scaled {
                start_virtual,
                start_real,
                k,
            } => {
                let elapsed_real = start_real.elapsed().as_secs_f64();
                let elapsed_virtual = elapsed_real * k;
                let now = *start_virtual + chrono::Duration::milliseconds(
                    (elapsed_virtual * 1000.0) as i64,
                );
                now.to_rfc3339()
            }
        }
    }

    /// Return the current tick as an integer, if this clock is in tick mode.
    pub fn time_step(&self) -> Option<i64> {
        match self {
            Clock::Tick { time_step } => Some(*time_step),
            Clock::Scaled { .. } => None,
        }
    }

    /// Advance the clock by one tick. No-op in scaled mode.
    pub fn advance(&mut self) {
        if let Clock::Tick { time_step } = self {
            *time_step += 1;
        }
    }

    /// Return the current virtual time as epoch seconds, used by the RecEngine
    /// time-decay scoring functions which need a numeric `t`.
    pub fn now_epoch_seconds(&self) -> i64 {
        match self {
            Clock::Tick { time_step } => *time_step,
            Clock::Scaled { .. } => {
                let now = self.now();
                chrono::DateTime::parse_from_rfc3339(&now)
                    .map(|d| d.timestamp())
                    .unwrap_or(0)
            }
        }
    }

    /// A `created_at` lower bound `days` back from now, in the same opaque
    /// format `now()` produces, for `trend`'s virtual-time window.
    /// Tick mode treats one day as one tick (ticks have no fixed
    /// wall-clock duration per the GLOSSARY, so a day-denominated window is
    /// simply `days` ticks back); scaled mode subtracts real calendar days.
    pub fn since_virtual_days(&self, days: u32) -> String {
        match self {
            Clock::Tick { time_step } => (time_step - i64::from(days)).max(0).to_string(),
            Clock::Scaled { .. } => {
                let now = chrono::DateTime::parse_from_rfc3339(&self.now())
                    .map(|d| d.with_timezone(&chrono::Utc))
                    .unwrap_or_else(|_| chrono::Utc::now());
                (now - chrono::Duration::days(i64::from(days))).to_rfc3339()
            }
        }
    }
}
