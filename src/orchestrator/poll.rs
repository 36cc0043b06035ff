//! Timing of the build-status waiting loop.
//!
//! The first re-check happens after `initial_interval`; every later interval
//! is `step` longer than the one before. Waiting stops once `ceiling` has
//! elapsed since the wait began.

use std::time::Duration;

const DEFAULT_INITIAL_INTERVAL_SECS: u64 = 1;

const DEFAULT_STEP_SECS: u64 = 5;

/// 30 minutes.
const DEFAULT_CEILING_MINS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub initial_interval: Duration,

    /// Added to the interval after every poll.
    pub step: Duration,

    /// Give up after this long. Configure via `MERGE_GATE_WAIT_CEILING_MINS`.
    pub ceiling: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitConfig {
    pub fn new() -> Self {
        WaitConfig {
            initial_interval: Duration::from_secs(DEFAULT_INITIAL_INTERVAL_SECS),
            step: Duration::from_secs(DEFAULT_STEP_SECS),
            ceiling: Duration::from_secs(DEFAULT_CEILING_MINS * 60),
        }
    }

    /// Reads `MERGE_GATE_WAIT_CEILING_MINS`; other values use defaults.
    pub fn from_env() -> Self {
        let ceiling_mins = std::env::var("MERGE_GATE_WAIT_CEILING_MINS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CEILING_MINS);

        WaitConfig {
            ceiling: Duration::from_secs(ceiling_mins * 60),
            ..Self::new()
        }
    }

    /// The sleep before poll `n` (0-indexed).
    pub fn interval_for_poll(&self, n: u32) -> Duration {
        self.initial_interval + self.step * n
    }

    /// How many polls fit before the ceiling.
    pub fn max_polls(&self) -> u32 {
        let mut elapsed = Duration::ZERO;
        let mut polls = 0;
        while elapsed < self.ceiling {
            elapsed += self.interval_for_poll(polls);
            polls += 1;
        }
        polls
    }
}

/// Formats a duration as hours, minutes and seconds, e.g. `30m0s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
