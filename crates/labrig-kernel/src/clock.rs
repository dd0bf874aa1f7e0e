//! Clock abstraction (injectable for testing).

use chrono::{DateTime, Utc};

/// Provides the current wall-clock time.
///
/// Reservation timestamps and stale-reservation ages are computed through this
/// trait rather than `Utc::now()` so that crash-recovery behaviour can be tested
/// deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The default [`Clock`] implementation backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
