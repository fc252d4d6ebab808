//! Tick counter services.
//!
//! Every tick source runs at [`TICK_RATE_HZ`], so one tick is one
//! millisecond. The tick resolution is also the smallest reaction time the
//! game can measure.

use core::fmt;
use core::time::Duration;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Tick rate shared by all tick sources, in Hz.
pub const TICK_RATE_HZ: u32 = 1_000;

/// Microseconds per second
const USEC_PER_SEC: u128 = 1_000_000;

/// Monotonic tick count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u64);

impl Tick {
    /// Tick zero, the moment the tick source was created
    pub const ZERO: Self = Self(0);

    /// Create a tick from a raw count
    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Get the raw tick count
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Ticks elapsed since `earlier`, saturating at zero.
    pub const fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Milliseconds elapsed since `earlier`.
    pub const fn millis_since(self, earlier: Tick) -> u64 {
        ticks_to_millis(self.since(earlier))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Tick {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}ticks", self.0);
    }
}

/// Convert a tick count to milliseconds.
pub const fn ticks_to_millis(ticks: u64) -> u64 {
    ticks * 1_000 / TICK_RATE_HZ as u64
}

/// Convert a duration to whole ticks, rounding down.
pub fn duration_to_ticks(duration: Duration) -> u64 {
    (duration.as_micros() * TICK_RATE_HZ as u128 / USEC_PER_SEC) as u64
}

/// Read-only access to a monotonic tick counter.
///
/// Implementations must never go backwards.
pub trait TickSource: Send + Sync {
    fn now(&self) -> Tick;
}

/// Tick source backed by the host's monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
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

impl TickSource for SystemClock {
    fn now(&self) -> Tick {
        Tick(duration_to_ticks(self.origin.elapsed()))
    }
}

/// Tick source advanced by hand. Used by tests and simulations that need
/// exact elapsed times.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }

    pub const fn starting_at(tick: Tick) -> Self {
        Self {
            ticks: AtomicU64::new(tick.0),
        }
    }

    /// Advance the counter and return the new tick.
    pub fn advance(&self, ticks: u64) -> Tick {
        Tick(self.ticks.fetch_add(ticks, Ordering::SeqCst) + ticks)
    }

    /// Advance the counter by a duration.
    pub fn advance_by(&self, duration: Duration) -> Tick {
        self.advance(duration_to_ticks(duration))
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Tick {
        Tick(self.ticks.load(Ordering::SeqCst))
    }
}
