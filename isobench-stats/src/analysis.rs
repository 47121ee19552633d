//! Full Analysis
//!
//! Bundles every statistic over one sample set and decides whether the set is
//! stable enough to be trusted.

use crate::summary::{max, mean, median, min, mode, standard_deviation, standard_error};
use crate::tdist::{ConfidenceLevel, margin_of_error};
use crate::StatsError;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// Relative tolerance (of the mean) allowed for both the margin of error and
/// the mean/median skew in the acceptance check.
pub const STABILITY_TOLERANCE: f64 = 0.1;

/// Descriptive and inferential statistics over one sample set (nanoseconds)
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, RkyvSerialize, RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct FullAnalysis {
    /// Fastest sample
    pub min: f64,
    /// Slowest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Most frequent value after rounding to whole nanoseconds
    pub mode: f64,
    /// Sample standard deviation
    pub standard_deviation: f64,
    /// `standard_deviation / n`
    pub standard_error: f64,
    /// Half-width of the confidence interval at `confidence_level`
    pub margin_of_error: f64,
    /// Confidence level (percent) of `margin_of_error`
    pub confidence_level: f64,
    /// Number of samples analysed
    pub sample_count: usize,
}

impl FullAnalysis {
    /// Compute the full analysis. Requires at least two samples.
    pub fn compute(samples: &[f64], confidence: ConfidenceLevel) -> Result<Self, StatsError> {
        Ok(Self {
            min: min(samples)?,
            max: max(samples)?,
            mean: mean(samples)?,
            median: median(samples)?,
            mode: mode(samples)?,
            standard_deviation: standard_deviation(samples)?,
            standard_error: standard_error(samples)?,
            margin_of_error: margin_of_error(samples, confidence)?,
            confidence_level: confidence.percent(),
            sample_count: samples.len(),
        })
    }

    /// Acceptance check: a tight confidence interval and a low mean/median skew.
    pub fn is_stable(&self) -> bool {
        let tolerance = self.mean * STABILITY_TOLERANCE;
        self.margin_of_error <= tolerance && (self.median - self.mean).abs() <= tolerance
    }

    /// Margin of error relative to the mean, in percent
    pub fn relative_margin(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            self.margin_of_error / self.mean * 100.0
        }
    }
}
