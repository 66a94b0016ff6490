use std::time::{Duration, Instant};

use mimir::DataType;

/// Timing of the current tick. Produced first in every cycle; every other module
/// consumes it so all age computations within one tick agree on "now".
#[derive(Clone, Copy, Debug)]
pub struct CycleInfo {
    /// When this tick started.
    pub start_time: Instant,
    /// The configured tick period.
    pub cycle_time: Duration,
}

impl CycleInfo {
    /// Duration from `instant` to the start of this tick, zero if `instant` is later.
    #[must_use]
    pub fn age(&self, instant: Instant) -> Duration {
        self.start_time.saturating_duration_since(instant)
    }

    /// Like [`CycleInfo::age`], treating `None` as infinitely old.
    #[must_use]
    pub fn age_of(&self, instant: Option<Instant>) -> Duration {
        instant.map_or(Duration::MAX, |instant| self.age(instant))
    }
}

impl Default for CycleInfo {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycle_time: Duration::from_millis(10),
        }
    }
}

impl DataType for CycleInfo {
    fn reset(&mut self) {
        // overwritten by the producer at the start of every tick
    }
}
