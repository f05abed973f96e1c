//! Accelerated world clock.
//!
//! Simulated time runs `time_ratio` times faster than real time: with the
//! default ratio of 120, one real minute is two simulated hours. The clock
//! stores only its origin and the real instant it started, so every copy
//! agrees on the current time without synchronization.
//!
//! Real time is measured with [`tokio::time::Instant`], which lets tests
//! pause and advance time deterministically.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tokio::time::Instant;

/// Simulated seconds in one simulated day.
const SECONDS_PER_DAY: u64 = 86_400;

/// Errors that can occur when building a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The time ratio must be at least 1.
    #[error("invalid time ratio {ratio}: must be at least 1")]
    InvalidRatio {
        /// The rejected ratio.
        ratio: u32,
    },
}

/// Maps real elapsed time onto accelerated simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldClock {
    /// Simulated timestamp at the moment the clock started.
    origin: DateTime<Utc>,

    /// Real instant the clock started.
    started: Instant,

    /// Simulated seconds per real second.
    time_ratio: u32,
}

impl WorldClock {
    /// Start a clock now, with the simulated origin at the current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidRatio`] if `time_ratio` is 0.
    pub fn new(time_ratio: u32) -> Result<Self, ClockError> {
        Self::from_parts(Utc::now(), Instant::now(), time_ratio)
    }

    /// Create a clock from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidRatio`] if `time_ratio` is 0.
    pub const fn from_parts(
        origin: DateTime<Utc>,
        started: Instant,
        time_ratio: u32,
    ) -> Result<Self, ClockError> {
        if time_ratio == 0 {
            return Err(ClockError::InvalidRatio { ratio: time_ratio });
        }
        Ok(Self {
            origin,
            started,
            time_ratio,
        })
    }

    /// Simulated seconds per real second.
    pub const fn time_ratio(&self) -> u32 {
        self.time_ratio
    }

    /// Simulated timestamp at which the clock started.
    pub const fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    /// Scale a real duration into simulated time. Saturates on overflow.
    pub fn to_simulated(&self, real: Duration) -> Duration {
        real.checked_mul(self.time_ratio).unwrap_or(Duration::MAX)
    }

    /// Scale a simulated duration back into real time.
    pub fn to_real(&self, simulated: Duration) -> Duration {
        simulated.checked_div(self.time_ratio).unwrap_or(simulated)
    }

    /// Simulated time elapsed since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.to_simulated(self.started.elapsed())
    }

    /// The current simulated timestamp.
    pub fn now(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.elapsed())
            .ok()
            .and_then(|delta| self.origin.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The current simulated day, starting at 1.
    pub fn day(&self) -> u32 {
        let days = self.elapsed().as_secs() / SECONDS_PER_DAY;
        u32::try_from(days).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Format the current simulated time as `Day d HH:MM`.
    pub fn format_now(&self) -> String {
        let now = self.now();
        format!("Day {} {:02}:{:02}", self.day(), now.hour(), now.minute())
    }
}
