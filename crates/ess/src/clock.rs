use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Anything that needs "now" takes a clock instead of asking the system, so
/// tests can pin time with a [`StaticClock`].
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wraps [`Utc::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Intended for tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticClock(pub DateTime<Utc>);

impl Clock for StaticClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
