//! # Timestamp Value Object
//!
//! UTC timestamps and an injectable [`Clock`].
//!
//! Quote expiry, balance staleness and reward accrual all read time through
//! a [`Clock`] so that tests can drive time explicitly with [`ManualClock`].

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A UTC point in time with millisecond-or-better precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix milliseconds.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(Self)
    }

    /// Wraps an existing chrono value.
    #[inline]
    #[must_use]
    pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner chrono value.
    #[inline]
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns this timestamp shifted by `secs` seconds (negative moves back).
    ///
    /// Saturates at the representable range.
    #[must_use]
    pub fn add_secs(self, secs: i64) -> Self {
        TimeDelta::try_seconds(secs)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map_or(self, Self)
    }

    /// Returns this timestamp shifted forward by a std duration.
    #[must_use]
    pub fn add_duration(self, duration: Duration) -> Self {
        TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map_or(self, Self)
    }

    /// Returns true if this timestamp is strictly before `other`.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns true if this timestamp is strictly after `other`.
    #[inline]
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self.0 > other.0
    }

    /// Elapsed time since `earlier`, zero if `earlier` is in the future.
    #[must_use]
    pub fn duration_since(&self, earlier: &Self) -> Duration {
        (self.0 - earlier.0).to_std().unwrap_or(Duration::ZERO)
    }

    /// Elapsed milliseconds since `earlier`, zero if `earlier` is in the future.
    #[must_use]
    pub fn millis_since(&self, earlier: &Self) -> i64 {
        (self.0 - earlier.0).num_milliseconds().max(0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.add_duration(by);
    }

    /// Sets the clock to an absolute time.
    pub fn set(&self, to: Timestamp) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Timestamp {
        Timestamp::from_millis(1_700_000_000_000).unwrap()
    }

    #[test]
    fn add_secs_moves_both_ways() {
        let t = base();
        assert!(t.add_secs(30).is_after(&t));
        assert!(t.add_secs(-30).is_before(&t));
        assert_eq!(t.add_secs(30).millis_since(&t), 30_000);
    }

    #[test]
    fn duration_since_saturates() {
        let t = base();
        let later = t.add_secs(5);
        assert_eq!(later.duration_since(&t), Duration::from_secs(5));
        assert_eq!(t.duration_since(&later), Duration::ZERO);
        assert_eq!(t.millis_since(&later), 0);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(base());
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now().millis_since(&base()), 1500);

        clock.set(base());
        assert_eq!(clock.now(), base());
    }

    #[test]
    fn serde_roundtrip() {
        let t = base();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(serde_json::from_str::<Timestamp>(&json).unwrap(), t);
    }
}
