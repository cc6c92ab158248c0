//! Test clock — deterministic `Clock` implementation for tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tapestry_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The fixed clock shared by engine tests, ready to hand to an orchestrator.
#[must_use]
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock::default())
}
