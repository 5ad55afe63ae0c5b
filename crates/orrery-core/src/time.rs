//! Monotonic clock, delta accumulators, and interval timers.
//!
//! Engine time is carried as `f64` seconds since engine construction.
//! `Instant`/`Duration` appear only at the OS boundary (epoch capture and
//! the frame-governor sleep).

use std::time::Instant;

/// Monotonic time source anchored at construction.
pub struct EngineClock {
    epoch: Instant,
}

impl EngineClock {
    /// Captures the epoch at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Seconds elapsed since the epoch. Never decreases.
    pub fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

impl Default for EngineClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks elapsed time between successive samples.
///
/// The first sample after construction returns the time since the zero
/// point (engine construction); callers that need a zero first delta must
/// seed it with an initial [`sample`](Self::sample).
#[derive(Debug, Clone, Copy, Default)]
pub struct Delta {
    last: f64,
    change: f64,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the time since the previous sample and moves the sample
    /// point to `now`. Spans that would be negative (the embedder moved
    /// the time offset backwards) clamp to zero.
    pub fn sample(&mut self, now: f64) -> f64 {
        self.change = (now - self.last).max(0.0);
        self.last = now;
        self.change
    }

    /// The most recently sampled delta, without resampling.
    pub fn latest(&self) -> f64 {
        self.change
    }
}

/// Fires at most once per configured interval.
///
/// Each firing resets the reference point to the query time, not to the
/// missed schedule, so a stalled loop does not burst-fire to catch up.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    interval: f64,
    reference: f64,
}

impl IntervalTimer {
    /// Creates a timer that first fires `interval` seconds after `now`.
    pub fn new(interval: f64, now: f64) -> Self {
        Self {
            interval,
            reference: now,
        }
    }

    /// The configured interval in seconds.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// True when at least one interval has passed since the last firing;
    /// a firing resets the reference to `now`.
    pub fn elapsed(&mut self, now: f64) -> bool {
        if now - self.reference >= self.interval {
            self.reference = now;
            true
        } else {
            false
        }
    }
}
