//! Evaluation clock.
//!
//! An evaluation is anchored to a single wall-clock [`Timestamp`] and advanced
//! with a monotonic [`Instant`], so every timestamp recorded during one pass is
//! consistent with the `now` used to judge cache freshness.

use std::time::{Duration, Instant};

use jiff::{SignedDuration, Timestamp};

/// Wall-clock anchor plus monotonic offset for one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    anchor: Timestamp,
    origin: Instant,
}

impl Clock {
    /// Creates a clock anchored at the given instant.
    pub fn anchored(anchor: Timestamp) -> Self {
        Self {
            anchor,
            origin: Instant::now(),
        }
    }

    /// Returns the anchor this clock was created with.
    #[inline]
    pub fn anchor(&self) -> Timestamp {
        self.anchor
    }

    /// Returns the anchor advanced by the time elapsed since creation.
    pub fn now(&self) -> Timestamp {
        offset(self.anchor, self.origin.elapsed())
    }
}

/// Adds a [`Duration`] to a [`Timestamp`], saturating at [`Timestamp::MAX`].
pub(crate) fn offset(timestamp: Timestamp, duration: Duration) -> Timestamp {
    SignedDuration::try_from(duration)
        .ok()
        .and_then(|duration| timestamp.checked_add(duration).ok())
        .unwrap_or(Timestamp::MAX)
}

/// Rounds a duration to whole microseconds (six decimal digits of a second).
pub(crate) fn round_micros(duration: Duration) -> Duration {
    let micros = duration.as_nanos().saturating_add(500) / 1_000;
    Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
}
