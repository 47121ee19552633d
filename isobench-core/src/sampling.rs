//! Sampling
//!
//! Repeats calibrated rounds and records the per-invocation time of each.

use crate::measure::{Clock, time_batch};
use isobench_ipc::BenchmarkOptions;

/// Time a single round of `count` invocations, normalized to one invocation
#[inline]
pub fn sample_round<C: Clock + ?Sized>(clock: &C, f: &mut dyn FnMut(), count: u64) -> f64 {
    let count = count.max(1);
    time_batch(clock, f, count) as f64 / count as f64
}

/// Collect per-invocation samples in chronological order.
///
/// `min_samples` rounds are always collected. After that, rounds continue
/// while the sum of the collected samples stays below `max_time_ns` and
/// fewer than `max_samples` rounds exist. The budget is compared against the
/// normalized samples, not the wall time spent in the rounds.
pub fn collect_samples<C: Clock + ?Sized>(
    clock: &C,
    f: &mut dyn FnMut(),
    count: u64,
    options: &BenchmarkOptions,
) -> Vec<f64> {
    let capacity = usize::try_from(options.max_samples).unwrap_or(usize::MAX).min(4096);
    let mut samples = Vec::with_capacity(capacity);
    let mut total = 0.0;

    while (samples.len() as u64) < options.min_samples {
        let sample = sample_round(clock, f, count);
        total += sample;
        samples.push(sample);
    }

    while total < options.max_time_ns as f64 && (samples.len() as u64) < options.max_samples {
        let sample = sample_round(clock, f, count);
        total += sample;
        samples.push(sample);
    }

    samples
}
