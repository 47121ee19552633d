//! Time Source
//!
//! Monotonic nanosecond clock plus an empirical estimate of its resolution.
//! The engine only ever talks to the [`Clock`] trait so calibration and
//! sampling can be driven by a deterministic clock in tests.

use std::hint::black_box;
use std::time::Instant;

/// Number of back-to-back readings used to estimate the clock resolution
const RESOLUTION_READS: usize = 1_000;

/// Monotonic time source
pub trait Clock {
    /// Nanoseconds since an arbitrary, fixed origin. Never decreases.
    fn now_ns(&self) -> u64;

    /// Smallest non-zero interval the clock can observe, in nanoseconds
    fn resolution_ns(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }

    fn resolution_ns(&self) -> f64 {
        (**self).resolution_ns()
    }
}

/// Production clock over [`std::time::Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
    resolution_ns: f64,
}

impl MonotonicClock {
    /// Create a clock and measure its resolution once
    pub fn new() -> Self {
        let origin = Instant::now();
        let resolution_ns = estimate_resolution(|| origin.elapsed().as_nanos() as u64);
        Self {
            origin,
            resolution_ns,
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn resolution_ns(&self) -> f64 {
        self.resolution_ns
    }
}

/// Smallest positive difference between consecutive distinct readings.
///
/// Falls back to 1ns when the reader never ticks during probing.
fn estimate_resolution(mut read: impl FnMut() -> u64) -> f64 {
    let mut smallest = u64::MAX;
    for _ in 0..RESOLUTION_READS {
        let start = read();
        let mut next = read();
        // Spin until the reading changes; bounded so a frozen reader terminates.
        let mut spins = 0u32;
        while next == start && spins < 10_000 {
            next = read();
            spins += 1;
        }
        if next > start {
            smallest = smallest.min(next - start);
        }
    }
    if smallest == u64::MAX { 1.0 } else { smallest as f64 }
}

/// Time `count` back-to-back invocations of `f`, returning elapsed nanoseconds
#[inline]
pub fn time_batch<C: Clock + ?Sized>(clock: &C, f: &mut dyn FnMut(), count: u64) -> u64 {
    let start = clock.now_ns();
    for _ in 0..count {
        f();
    }
    black_box(clock.now_ns().saturating_sub(start))
}
