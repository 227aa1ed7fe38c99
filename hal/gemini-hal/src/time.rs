//! Time sources
//!
//! All protocol deadlines are computed by comparing a free-running
//! microsecond counter against a stored timestamp, so the counter is allowed
//! to wrap.

pub use embedded_hal::delay::DelayNs;

/// Monotonic microsecond clock
///
/// The counter wraps at `u32::MAX` (about 71 minutes). Elapsed times are
/// computed with wrapping subtraction and stay correct across the wrap as
/// long as the interval itself is shorter than the wrap period.
pub trait MonotonicClock {
    /// Current counter value in microseconds
    fn now_micros(&self) -> u32;

    /// Microseconds elapsed since `earlier`
    fn micros_since(&self, earlier: u32) -> u32 {
        self.now_micros().wrapping_sub(earlier)
    }
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now_micros(&self) -> u32 {
        (**self).now_micros()
    }
}
