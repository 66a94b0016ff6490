use std::time::{Duration, Instant};

use mimir::DataType;

pub use gjallarhorn::team_message::{NtpRequest, NtpResponse};

/// The shared millisecond clock the team messages are stamped with: milliseconds since
/// this process started. Registered once as an input slot at startup.
#[derive(Clone, Copy, Debug)]
pub struct TeamClock {
    base: Instant,
}

impl TeamClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
        }
    }

    /// Local milliseconds for an instant.
    #[must_use]
    pub fn millis(&self, instant: Instant) -> u32 {
        instant.saturating_duration_since(self.base).as_millis() as u32
    }

    /// The instant for local milliseconds.
    #[must_use]
    pub fn instant(&self, millis: i64) -> Instant {
        if millis <= 0 {
            self.base
        } else {
            self.base + Duration::from_millis(millis as u64)
        }
    }
}

impl Default for TeamClock {
    fn default() -> Self {
        Self::new()
    }
}

impl DataType for TeamClock {
    fn reset(&mut self) {
        // the clock base never changes
    }
}

/// One NTP request received from a teammate, with the local receipt timestamp.
#[derive(Clone, Copy, Debug)]
pub struct ReceivedNtpRequest {
    /// Player number of the requester.
    pub sender: u8,
    /// The requester-local origination timestamp, milliseconds.
    pub origination: u32,
    /// Local milliseconds when the request arrived.
    pub receipt: u32,
}

/// The NTP requests received this tick, answered with the next outgoing team message.
#[derive(Clone, Debug, Default)]
pub struct NtpData {
    pub requests: Vec<ReceivedNtpRequest>,
}

impl DataType for NtpData {}
