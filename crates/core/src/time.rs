use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MICROS_PER_DAY: i64 = 86_400_000_000;

/// UTC calendar-day partition key: floor(timestamp_micros / one day).
/// Every span maps to exactly one bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DayBucket(i64);

impl DayBucket {
    pub fn new(index: i64) -> Self {
        Self(index)
    }

    pub fn from_micros(timestamp: i64) -> Self {
        Self(timestamp.div_euclid(MICROS_PER_DAY))
    }

    pub fn index(self) -> i64 {
        self.0
    }

    /// First microsecond of the day, inclusive.
    pub fn start_micros(self) -> i64 {
        self.0 * MICROS_PER_DAY
    }

    /// First microsecond of the following day, exclusive.
    pub fn end_micros(self) -> i64 {
        (self.0 + 1) * MICROS_PER_DAY
    }

    pub fn utc_start(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.start_micros())
    }
}

impl fmt::Display for DayBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.utc_start() {
            Some(ts) => write!(f, "{}", ts.format("%Y-%m-%d")),
            None => write!(f, "day#{}", self.0),
        }
    }
}
