//! Microsecond-precision timestamps used for history, archive, TTL, and
//! replication ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A point in time, stored as microseconds since the Unix epoch.
///
/// Using an integer (rather than `SystemTime` or `chrono::DateTime`
/// directly) keeps on-disk records fixed-width and trivially comparable,
/// matching the teacher storage layer's `Timestamp` newtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Construct from a raw microsecond count.
    pub fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        Timestamp(micros)
    }

    /// Raw microsecond count.
    pub fn as_micros(&self) -> u64 {
        self.0
    }

    /// Add a duration, saturating rather than overflowing.
    pub fn saturating_add(self, other: std::time::Duration) -> Self {
        Timestamp(self.0.saturating_add(other.as_micros() as u64))
    }

    /// Subtract a duration, saturating at zero.
    pub fn saturating_sub(self, other: std::time::Duration) -> Self {
        Timestamp(self.0.saturating_sub(other.as_micros() as u64))
    }

    /// RFC3339 rendering for human-facing output (history listings, CLI).
    pub fn to_rfc3339(self) -> String {
        let secs = (self.0 / 1_000_000) as i64;
        let nanos = ((self.0 % 1_000_000) * 1000) as u32;
        chrono::DateTime::from_timestamp(secs, nanos)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}
