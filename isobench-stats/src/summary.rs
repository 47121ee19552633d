//! Descriptive Statistics
//!
//! Central tendency and dispersion over a non-empty sample set.

use crate::StatsError;
use std::cmp::Ordering;
use std::collections::BTreeMap;

fn non_empty(samples: &[f64]) -> Result<&[f64], StatsError> {
    if samples.is_empty() {
        Err(StatsError::Empty)
    } else {
        Ok(samples)
    }
}

/// Arithmetic mean
pub fn mean(samples: &[f64]) -> Result<f64, StatsError> {
    let samples = non_empty(samples)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Smallest sample
pub fn min(samples: &[f64]) -> Result<f64, StatsError> {
    non_empty(samples)?
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .ok_or(StatsError::Empty)
}

/// Largest sample
pub fn max(samples: &[f64]) -> Result<f64, StatsError> {
    non_empty(samples)?
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .ok_or(StatsError::Empty)
}

/// Median: the central element of the sorted samples, or the average of the
/// two central elements for an even count.
pub fn median(samples: &[f64]) -> Result<f64, StatsError> {
    let mut sorted = non_empty(samples)?.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Mode of the samples rounded to the nearest integer.
///
/// Ties between equally large groups resolve to the smallest value.
pub fn mode(samples: &[f64]) -> Result<f64, StatsError> {
    let samples = non_empty(samples)?;

    let mut groups: BTreeMap<i64, usize> = BTreeMap::new();
    for sample in samples {
        *groups.entry(sample.round() as i64).or_default() += 1;
    }

    // BTreeMap iterates ascending, so the first maximum seen is the smallest value.
    let mut best: Option<(i64, usize)> = None;
    for (value, count) in groups {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((value, count)),
        }
    }

    best.map(|(value, _)| value as f64).ok_or(StatsError::Empty)
}

/// Sample standard deviation (Bessel-corrected, divides by `n - 1`)
pub fn standard_deviation(samples: &[f64]) -> Result<f64, StatsError> {
    let samples = non_empty(samples)?;
    if samples.len() < 2 {
        return Err(StatsError::InsufficientSamples {
            got: samples.len(),
            need: 2,
        });
    }

    let mean = mean(samples)?;
    let variance =
        samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
    Ok(variance.sqrt())
}

/// Standard error as used throughout isobench: `standard_deviation / n`.
///
/// This intentionally differs from the classical standard error of the mean
/// (`standard_deviation / sqrt(n)`). Stored results, margins of error and the
/// acceptance thresholds are all expressed against this form, so it must not
/// be changed independently of them.
pub fn standard_error(samples: &[f64]) -> Result<f64, StatsError> {
    let sd = standard_deviation(samples)?;
    Ok(sd / samples.len() as f64)
}
