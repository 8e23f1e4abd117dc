//! Clock and time-unit utilities.
//!
//! Every timeline boundary in Storyreel is an integer number of microseconds.
//! This module provides utilities for:
//! - Converting TTS ticks (100 ns) and fractional seconds to microseconds
//! - Capturing the host wall clock once per bundle write

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};

/// Speech-synthesis offsets are expressed in 100-nanosecond ticks.
pub const TICKS_PER_MICROSECOND: u64 = 10;

/// Microseconds per second.
pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Smallest duration a placed segment may have.
pub const MIN_DURATION_US: u64 = 1;

/// Convert 100-ns ticks to microseconds (truncating).
pub fn ticks_to_us(ticks: u64) -> u64 {
    ticks / TICKS_PER_MICROSECOND
}

/// Convert fractional seconds to microseconds, rounding to the nearest
/// microsecond. Negative and non-finite inputs map to 0.
pub fn secs_to_us(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * MICROS_PER_SECOND as f64).round() as u64
}

/// Convert microseconds to fractional seconds.
pub fn us_to_secs(us: u64) -> f64 {
    us as f64 / MICROS_PER_SECOND as f64
}

/// Floor a degenerate duration to [`MIN_DURATION_US`].
pub fn floor_duration_us(us: u64) -> u64 {
    us.max(MIN_DURATION_US)
}

/// Seconds since the Unix epoch for a filesystem timestamp.
pub fn system_time_to_unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as i64,
        Err(before) => -(before.duration().as_secs() as i64),
    }
}

/// A wall-clock instant captured once and reused for every timestamp of a
/// single bundle write, so all documents agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostClock {
    at: DateTime<Utc>,
}

impl HostClock {
    /// Capture the host clock now.
    pub fn now() -> Self {
        Self { at: Utc::now() }
    }

    /// Clock pinned to a known instant (tests, replays).
    pub fn at(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Clock pinned to a Unix timestamp in seconds.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self {
            at: Utc.timestamp_opt(secs, 0).single().unwrap_or_default(),
        }
    }

    /// Whole seconds since the Unix epoch.
    pub fn unix_secs(&self) -> i64 {
        self.at.timestamp()
    }

    /// Microseconds since the Unix epoch.
    pub fn unix_micros(&self) -> i64 {
        self.at.timestamp_micros()
    }

    /// The captured instant.
    pub fn datetime(&self) -> DateTime<Utc> {
        self.at
    }
}
