//! Calibration
//!
//! Finds how many back-to-back invocations make one round last longer than a
//! time floor, so that clock granularity is negligible against the round.

use crate::measure::{Clock, time_batch};
use isobench_stats::reduce_uncertainty;
use thiserror::Error;

/// Calibration gives up once a round would need more invocations than this
pub const MAX_CALIBRATION_COUNT: u64 = 1 << 40;

/// Fraction of a round the clock's resolution may account for
pub const RESOLUTION_UNCERTAINTY: f64 = 0.01;

/// Calibration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    /// The round never exceeded the floor; the clock is not advancing
    #[error("calibration diverged: {count} invocations still took <= {min_time_ns}ns")]
    Diverged {
        /// Last count tried
        count: u64,
        /// Floor that was never exceeded
        min_time_ns: u64,
    },
}

/// Effective floor for a round: the configured minimum, raised so the clock's
/// resolution stays within [`RESOLUTION_UNCERTAINTY`] of the round.
pub fn effective_min_time<C: Clock + ?Sized>(clock: &C, configured_ns: u64) -> u64 {
    let from_resolution = reduce_uncertainty(clock.resolution_ns(), RESOLUTION_UNCERTAINTY);
    configured_ns.max(from_resolution.ceil() as u64)
}

/// Grow the invocation count until one round takes strictly longer than
/// `min_time_ns`.
pub fn calibrate<C: Clock + ?Sized>(
    clock: &C,
    f: &mut dyn FnMut(),
    min_time_ns: u64,
) -> Result<u64, CalibrationError> {
    calibrate_bounded(clock, f, min_time_ns, MAX_CALIBRATION_COUNT)
}

fn calibrate_bounded<C: Clock + ?Sized>(
    clock: &C,
    f: &mut dyn FnMut(),
    min_time_ns: u64,
    limit: u64,
) -> Result<u64, CalibrationError> {
    let mut count: u64 = 1;

    loop {
        let elapsed = time_batch(clock, f, count);
        if elapsed > min_time_ns {
            return Ok(count);
        }

        let next = if elapsed == 0 {
            count.saturating_mul(100)
        } else {
            let period = elapsed as f64 / count as f64;
            let missing = ((min_time_ns - elapsed) as f64 / period).ceil() as u64;
            count.saturating_add(missing.max(1))
        };

        if next > limit {
            return Err(CalibrationError::Diverged { count, min_time_ns });
        }
        count = next;
    }
}
