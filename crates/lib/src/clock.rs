//! Time provider abstraction
//!
//! Every trace is stamped with a logical creation time taken from a [`Clock`].
//! Production code uses [`SystemClock`]; tests swap in [`FixedClock`] so that chains
//! have predictable, strictly increasing timestamps.
//!
//! # Example
//!
//! ```
//! use retrace::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let millis = clock.now_millis();
//! assert!(millis > 0);
//! ```

use std::fmt::Debug;

#[cfg(any(test, feature = "testing"))]
use std::sync::atomic::{AtomicU64, Ordering};

/// A time provider for trace timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Returns the current time as an RFC3339-formatted string.
    fn now_rfc3339(&self) -> String {
        format_millis(self.now_millis())
    }
}

/// Render a millisecond timestamp as RFC3339, falling back to the epoch when out of range.
pub fn format_millis(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string())
}

/// Production clock using real system time through [`chrono::Utc`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Test clock that steps forward by a fixed amount on every reading.
///
/// A step of zero freezes the clock, which is how tests force several traces to share
/// one timestamp and exercise the sequence-number tie-break.
///
/// ```ignore
/// use retrace::{Clock, FixedClock};
///
/// let clock = FixedClock::new(1000);
/// assert_eq!(clock.now_millis(), 1000);
/// assert_eq!(clock.now_millis(), 1001);
///
/// let frozen = FixedClock::frozen(5000);
/// assert_eq!(frozen.now_millis(), frozen.now_millis());
/// ```
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicU64,
    step: u64,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a clock starting at `millis` that advances by one millisecond per reading.
    pub fn new(millis: u64) -> Self {
        Self::with_step(millis, 1)
    }

    /// Create a clock that never advances on its own.
    pub fn frozen(millis: u64) -> Self {
        Self::with_step(millis, 0)
    }

    /// Create a clock that advances by `step` milliseconds per reading.
    pub fn with_step(millis: u64, step: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
            step,
        }
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: u64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.millis.store(ms, Ordering::SeqCst);
    }

    /// Get the current time without advancing.
    pub fn get(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.millis.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}
