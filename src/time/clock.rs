//! Monotonic and virtual clocks
//!
//! `SystemClock` wraps `std::time::Instant`; `ManualClock` is a shared virtual
//! clock whose `sleep` advances time instantly, used by tests and dry runs.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A time source the executor can read and block on.
pub trait Clock {
    /// Current time relative to the clock origin.
    fn now(&self) -> Timestamp;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Sleep until `deadline`, returning immediately if it already passed.
    ///
    /// Only the remainder is slept, so per-step overhead never accumulates.
    fn sleep_until(&self, deadline: Timestamp) {
        let now = self.now();
        if deadline.is_after(now) {
            self.sleep(deadline.duration_since(now));
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Monotonic wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp::from_duration(self.origin.elapsed())
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Virtual clock: `sleep` advances time without blocking.
///
/// Clones share the same underlying time, so a test can hold one handle while
/// the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<Mutex<u64>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    /// Create a virtual clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut nanos = self.nanos.lock();
        *nanos = nanos.saturating_add(duration.as_nanos() as u64);
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Sum of all requested sleeps.
    pub fn total_slept(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(*self.nanos.lock())
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
    }
}

/// Nanoseconds since a clock origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from raw nanoseconds.
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from an offset since the origin.
    #[inline]
    pub fn from_duration(offset: Duration) -> Self {
        Self(offset.as_nanos() as u64)
    }

    /// Raw nanoseconds.
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Seconds as a float.
    #[inline]
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// This timestamp shifted forward by `secs` seconds. Negative or
    /// non-finite offsets leave it unchanged.
    #[inline]
    pub fn offset_by_secs(&self, secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self(self.0.saturating_add((secs * 1_000_000_000.0) as u64))
        } else {
            *self
        }
    }

    /// Duration since an earlier timestamp, saturating at zero.
    #[inline]
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Check if this timestamp is after another.
    #[inline]
    pub fn is_after(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }
}

/// Convert fractional seconds into a `Duration`, clamping negatives and NaN to
/// zero and saturating at `Duration::MAX`.
#[inline]
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
