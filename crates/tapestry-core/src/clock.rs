//! Clock abstraction for deterministic history timestamps.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
///
/// Only history entries are stamped with it; playback timing runs on the
/// async runtime's timer so that tests can pause and advance it.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
