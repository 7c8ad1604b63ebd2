//! Message timestamps

use std::fmt;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

pub const NANOS_PER_SEC: u32 = 1_000_000_000;
pub const NANOS_PER_MILLI: u32 = 1_000_000;

/// A message timestamp split into seconds and nanoseconds.
///
/// `nsec` is always kept below one second, so the derived ordering on
/// `(sec, nsec)` is the chronological one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawTime")]
pub struct Time {
    pub sec: u32,
    pub nsec: u32,
}

/// Serialized form, normalized on the way in
#[derive(Deserialize)]
struct RawTime {
    sec: u32,
    nsec: u32,
}

impl From<RawTime> for Time {
    fn from(raw: RawTime) -> Self {
        Time::new(raw.sec, raw.nsec)
    }
}

impl Time {
    pub const ZERO: Time = Time { sec: 0, nsec: 0 };

    /// Create a time, carrying whole seconds out of `nsec`
    pub fn new(sec: u32, nsec: u32) -> Self {
        Self {
            sec: sec.saturating_add(nsec / NANOS_PER_SEC),
            nsec: nsec % NANOS_PER_SEC,
        }
    }

    /// Build a time from a total nanosecond count
    pub fn from_nanos(nanos: u64) -> Self {
        let per_sec = NANOS_PER_SEC as u64;
        let sec = (nanos / per_sec).min(u32::MAX as u64) as u32;
        Self {
            sec,
            nsec: (nanos % per_sec) as u32,
        }
    }

    /// Total nanoseconds since the epoch of the recording
    pub fn as_nanos(&self) -> u64 {
        self.sec as u64 * NANOS_PER_SEC as u64 + self.nsec as u64
    }

    /// Time as fractional seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 / NANOS_PER_SEC as f64
    }

    /// Subtract a (possibly fractional) number of milliseconds.
    ///
    /// The amount is rounded to whole nanoseconds. Results before zero clamp
    /// to zero and non-positive amounts leave the time unchanged.
    pub fn saturating_sub_millis(&self, millis: f64) -> Time {
        let nanos = (millis * NANOS_PER_MILLI as f64).round();
        if nanos.is_nan() || nanos <= 0.0 {
            return *self;
        }
        Time::from_nanos(self.as_nanos().saturating_sub(nanos as u64))
    }

    /// Wall clock interpretation, for display and logs
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.sec as i64, self.nsec)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}
