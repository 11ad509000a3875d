//! Per-check results.
//!
//! A [`CheckResult`] is produced once per check run (or timeout) and is never
//! modified afterwards. It lives in the result cache until the next run of the
//! same check replaces it.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::clock::offset;

/// Output recorded for a check that did not finish before its deadline.
pub const TIMEOUT_OUTPUT: &str = "Timeout";

/// Outcome of a single check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the check that produced this result.
    pub checker: String,
    /// Diagnostic message returned by the check.
    pub output: String,
    /// Whether the check passed.
    pub passed: bool,
    /// When the result was recorded, as epoch seconds.
    #[serde(with = "epoch_seconds")]
    pub timestamp: Timestamp,
    /// When the result stops being served from the cache, as epoch seconds.
    #[serde(with = "epoch_seconds")]
    pub expires: Timestamp,
    /// Wall time spent running the check, as seconds.
    #[serde(with = "seconds")]
    pub response_time: Duration,
}

impl CheckResult {
    /// Creates a result recorded at `timestamp` that expires after `ttl`.
    pub fn new(
        checker: impl Into<String>,
        passed: bool,
        output: impl Into<String>,
        timestamp: Timestamp,
        ttl: Duration,
        response_time: Duration,
    ) -> Self {
        Self {
            checker: checker.into(),
            output: output.into(),
            passed,
            timestamp,
            expires: offset(timestamp, ttl),
            response_time,
        }
    }

    /// Returns `true` while the result may still be served from the cache.
    #[inline]
    pub fn is_fresh(&self, now: Timestamp) -> bool {
        now < self.expires
    }
}

/// Timestamps as fractional epoch seconds with microsecond precision.
mod epoch_seconds {
    use jiff::Timestamp;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(timestamp.as_microsecond() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Timestamp::from_microsecond((secs * 1_000_000.0).round() as i64).map_err(D::Error::custom)
    }
}

/// Durations as fractional seconds.
mod seconds {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
