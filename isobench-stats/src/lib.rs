#![warn(missing_docs)]
//! isobench Statistical Engine
//!
//! Pure functions over a sample set (per-invocation nanoseconds):
//! - Descriptive statistics (mean, median, mode, min, max, standard deviation)
//! - Inferential statistics (standard error, margin of error via a Student's-t table)
//! - Resolution-aware floors for measurement rounds (`reduce_uncertainty`)
//! - `FullAnalysis` bundling all of the above plus the acceptance check
//!
//! Every function treats an empty sample set as a precondition violation and
//! returns [`StatsError::Empty`] instead of a silent zero.

mod analysis;
mod summary;
mod tdist;

pub use analysis::{FullAnalysis, STABILITY_TOLERANCE};
pub use summary::{max, mean, median, min, mode, standard_deviation, standard_error};
pub use tdist::{ConfidenceLevel, margin_of_error, reduce_uncertainty, t_score};

use thiserror::Error;

/// Confidence level used by the acceptance check.
pub const ACCEPTANCE_CONFIDENCE: ConfidenceLevel = ConfidenceLevel::P99_9;

/// Errors produced by the statistics functions
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// The sample set was empty.
    #[error("sample set is empty")]
    Empty,

    /// The statistic needs more samples than were provided.
    #[error("not enough samples: got {got}, need at least {need}")]
    InsufficientSamples {
        /// Samples provided
        got: usize,
        /// Samples required
        need: usize,
    },

    /// The confidence level is not one of the tabulated levels.
    #[error("unsupported confidence level: {0}% (expected one of 0, 50, 60, 70, 80, 90, 95, 98, 99, 99.8, 99.9)")]
    UnsupportedConfidence(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceptance_confidence() {
        assert_eq!(ACCEPTANCE_CONFIDENCE.percent(), 99.9);
    }

    #[test]
    fn test_error_messages() {
        let err = StatsError::InsufficientSamples { got: 1, need: 2 };
        assert_eq!(err.to_string(), "not enough samples: got 1, need at least 2");
    }
}
