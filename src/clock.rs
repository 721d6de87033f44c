//! Time sources for the throttle.
//!
//! The controller never calls `Instant::now()` directly; it asks a [`Clock`]. Production
//! code uses [`SystemClock`], while tests drive a [`ManualClock`] forward explicitly so
//! throttling decisions are deterministic.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use web_time::Instant;

/// Converts seconds to a [`Duration`], saturating instead of panicking.
///
/// Zero, negative and NaN inputs give [`Duration::ZERO`]; anything too large to
/// represent (including infinity) gives [`Duration::MAX`].
///
/// ```
/// use std::time::Duration;
/// use tqdm::clock::duration_from_secs;
///
/// assert_eq!(duration_from_secs(0.25), Duration::from_millis(250));
/// assert_eq!(duration_from_secs(f64::INFINITY), Duration::MAX);
/// ```
#[must_use]
pub fn duration_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// A source of monotonic timestamps.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The wall clock, backed by [`web_time::Instant`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Cloning is cheap and every clone observes the same time, so a test can keep one
/// handle while the controller owns another.
///
/// ```
/// use std::time::Duration;
/// use tqdm::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// let t0 = clock.now();
/// clock.advance(Duration::from_millis(1500));
/// assert_eq!(clock.now() - t0, Duration::from_millis(1500));
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves the clock forward by `by`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&self, by: Duration) {
        // u64 nanoseconds cover ~584 years.
        let nanos = by.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.offset_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Moves the clock forward by a number of seconds.
    ///
    /// Zero, negative and NaN inputs leave the clock where it is.
    pub fn advance_secs(&self, secs: f64) {
        self.advance(duration_from_secs(secs));
    }

    /// Total time this clock has been advanced.
    #[must_use]
    pub fn offset(&self) -> Duration {
        Duration::from_nanos(self.offset_nanos.load(Ordering::Relaxed))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset()
    }
}
