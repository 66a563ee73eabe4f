//! Unix timestamps and clock skew handling.
//!
//! Signed requests carry the signer's clock as whole seconds since the Unix
//! epoch. The verifier accepts them only inside a configurable skew window
//! around its own clock.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::encoding::{CanonicalDecode, CanonicalEncode, DecodeError};
use crate::MAX_CLOCK_SKEW_SECS;

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct UnixTime(pub i64);

impl UnixTime {
    /// Creates a timestamp from seconds since the Unix epoch.
    pub const fn new(secs: i64) -> Self {
        Self(secs)
    }

    /// Returns the current time.
    ///
    /// A system clock set before 1970 reads as negative seconds.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Self(d.as_secs() as i64),
            Err(e) => Self(-(e.duration().as_secs() as i64)),
        }
    }

    /// Returns the seconds since the Unix epoch.
    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    /// Returns the absolute distance to `other` in seconds.
    pub fn abs_diff(&self, other: &UnixTime) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Returns true if this timestamp is within `max_skew_secs` of `reference`.
    pub fn within_skew(&self, reference: &UnixTime, max_skew_secs: i64) -> bool {
        self.abs_diff(reference) <= max_skew_secs.max(0) as u64
    }

    /// Returns this timestamp moved by `secs`, saturating at the bounds.
    pub fn offset(&self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl CanonicalEncode for UnixTime {
    fn encode(&self, buf: &mut BytesMut) {
        self.0.encode(buf);
    }
}

impl CanonicalDecode for UnixTime {
    fn decode(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(Self(i64::decode(buf)?))
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl From<i64> for UnixTime {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl From<UnixTime> for i64 {
    fn from(ts: UnixTime) -> Self {
        ts.0
    }
}

/// Clock skew validator for signed request timestamps.
#[derive(Debug, Clone, Copy)]
pub struct ClockSkewValidator {
    max_skew_secs: i64,
}

impl ClockSkewValidator {
    /// Creates a new validator with the default max skew.
    pub fn new() -> Self {
        Self {
            max_skew_secs: MAX_CLOCK_SKEW_SECS,
        }
    }

    /// Creates a new validator with a custom max skew.
    pub fn with_max_skew(max_skew_secs: i64) -> Self {
        Self { max_skew_secs }
    }

    /// Returns the configured window in seconds.
    pub fn max_skew_secs(&self) -> i64 {
        self.max_skew_secs
    }

    /// Validates that `timestamp` is within the window around `now`.
    pub fn validate_at(&self, timestamp: UnixTime, now: UnixTime) -> Result<(), ClockSkewError> {
        if timestamp.within_skew(&now, self.max_skew_secs) {
            Ok(())
        } else {
            Err(ClockSkewError {
                timestamp,
                reference: now,
                skew_secs: timestamp.abs_diff(&now),
                max_skew_secs: self.max_skew_secs,
            })
        }
    }

    /// Validates that `timestamp` is within the window around the current time.
    pub fn validate(&self, timestamp: UnixTime) -> Result<(), ClockSkewError> {
        self.validate_at(timestamp, UnixTime::now())
    }

    /// Oldest timestamp still inside the window around `now`.
    pub fn oldest_accepted(&self, now: UnixTime) -> UnixTime {
        now.offset(-self.max_skew_secs.max(0))
    }
}

impl Default for ClockSkewValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Error when a timestamp exceeds the acceptable clock skew.
#[derive(Debug, Clone)]
pub struct ClockSkewError {
    /// The timestamp that was validated.
    pub timestamp: UnixTime,
    /// The reference timestamp (usually now).
    pub reference: UnixTime,
    /// The actual skew in seconds.
    pub skew_secs: u64,
    /// The maximum allowed skew.
    pub max_skew_secs: i64,
}

impl fmt::Display for ClockSkewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Clock skew exceeded: {}s (max {}s)",
            self.skew_secs, self.max_skew_secs
        )
    }
}

impl std::error::Error for ClockSkewError {}
