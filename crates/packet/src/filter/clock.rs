use chrono::{DateTime, Utc};

/// Source of "now" for time-based filters.
pub trait Clock: Send + Sync {
    /// Milliseconds since the unix epoch.
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that never moves. Used to make time-based filters reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(i64);

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        Self(now_ms)
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self(now.timestamp_millis())
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}
