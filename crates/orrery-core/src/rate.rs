//! Once-per-second-quantized event rate counter.

/// Smooths a per-second event tally into a stable published rate.
///
/// Every [`tick`](Self::tick) counts one event. When the integer second of
/// `now` exceeds the integer second of the previous tick, the running tally
/// is published and reset before the current event is counted, so the
/// boundary-crossing event belongs to the new second. This is a quantized
/// once-per-second reading, not a sliding-window average.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateCounter {
    tally: u32,
    value: u32,
    last: f64,
}

impl RateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one event at time `now` (seconds).
    pub fn tick(&mut self, now: f64) {
        if now.floor() > self.last.floor() {
            self.value = self.tally;
            self.tally = 0;
        }
        self.tally += 1;
        self.last = now;
    }

    /// The most recently published events-per-second reading.
    ///
    /// The first published value may cover a partial first second and
    /// should be treated as provisional.
    pub fn value(&self) -> u32 {
        self.value
    }
}
