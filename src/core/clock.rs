//! Millisecond tick counter shared by every timer in the core.
//!
//! Timestamps are a cyclic `u32` counter, so they wrap roughly every 49.7
//! days. Elapsed time is always taken with wrapping subtraction and must
//! never be computed by comparing two timestamps directly.

use std::time::{Duration, Instant};

/// A point on the cyclic millisecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    pub const fn from_millis(ms: u32) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, correct across one counter wrap.
    pub fn since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(u64::from(self.0.wrapping_sub(earlier.0)))
    }

    /// The timestamp `ms` milliseconds later, wrapping at `u32::MAX`.
    pub const fn wrapping_add_millis(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }
}

/// Source of monotonic timestamps.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Clock backed by [`Instant`], truncated onto the cyclic counter.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        // Truncation is the wrap.
        Timestamp(self.origin.elapsed().as_millis() as u32)
    }
}
