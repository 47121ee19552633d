//! Student's t Critical Values
//!
//! Two-sided critical values of the t distribution for the tabulated
//! confidence levels, plus the margin-of-error and resolution helpers built on
//! top of them.

use crate::StatsError;
use crate::summary::standard_error;

/// Two-sided confidence levels available in the t table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    /// 0%
    P0,
    /// 50%
    P50,
    /// 60%
    P60,
    /// 70%
    P70,
    /// 80%
    P80,
    /// 90%
    P90,
    /// 95%
    P95,
    /// 98%
    P98,
    /// 99%
    P99,
    /// 99.8%
    P99_8,
    /// 99.9%
    P99_9,
}

impl ConfidenceLevel {
    /// All levels in ascending order
    pub const ALL: [ConfidenceLevel; 11] = [
        ConfidenceLevel::P0,
        ConfidenceLevel::P50,
        ConfidenceLevel::P60,
        ConfidenceLevel::P70,
        ConfidenceLevel::P80,
        ConfidenceLevel::P90,
        ConfidenceLevel::P95,
        ConfidenceLevel::P98,
        ConfidenceLevel::P99,
        ConfidenceLevel::P99_8,
        ConfidenceLevel::P99_9,
    ];

    /// The level as a percentage
    pub fn percent(self) -> f64 {
        match self {
            ConfidenceLevel::P0 => 0.0,
            ConfidenceLevel::P50 => 50.0,
            ConfidenceLevel::P60 => 60.0,
            ConfidenceLevel::P70 => 70.0,
            ConfidenceLevel::P80 => 80.0,
            ConfidenceLevel::P90 => 90.0,
            ConfidenceLevel::P95 => 95.0,
            ConfidenceLevel::P98 => 98.0,
            ConfidenceLevel::P99 => 99.0,
            ConfidenceLevel::P99_8 => 99.8,
            ConfidenceLevel::P99_9 => 99.9,
        }
    }

    /// Column in [`T_TABLE`], `None` for the 0% level
    fn column(self) -> Option<usize> {
        match self {
            ConfidenceLevel::P0 => None,
            other => Some(other as usize - 1),
        }
    }
}

impl TryFrom<f64> for ConfidenceLevel {
    type Error = StatsError;

    /// Accepts only the tabulated percentages; anything else is rejected.
    fn try_from(percent: f64) -> Result<Self, Self::Error> {
        ConfidenceLevel::ALL
            .into_iter()
            .find(|level| (level.percent() - percent).abs() < 1e-9)
            .ok_or(StatsError::UnsupportedConfidence(percent))
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Degrees of freedom used for the open-ended last row
const DF_INFINITY: u64 = u64::MAX;

/// Rows of (degrees of freedom, critical values for 50, 60, 70, 80, 90, 95,
/// 98, 99, 99.8 and 99.9 percent).
const T_TABLE: [(u64, [f64; 10]); 36] = [
    (1, [1.000, 1.376, 1.963, 3.078, 6.314, 12.71, 31.82, 63.66, 318.3, 636.6]),
    (2, [0.816, 1.061, 1.386, 1.886, 2.920, 4.303, 6.965, 9.925, 22.33, 31.60]),
    (3, [0.765, 0.978, 1.250, 1.638, 2.353, 3.182, 4.541, 5.841, 10.21, 12.92]),
    (4, [0.741, 0.941, 1.190, 1.533, 2.132, 2.776, 3.747, 4.604, 7.173, 8.610]),
    (5, [0.727, 0.920, 1.156, 1.476, 2.015, 2.571, 3.365, 4.032, 5.893, 6.869]),
    (6, [0.718, 0.906, 1.134, 1.440, 1.943, 2.447, 3.143, 3.707, 5.208, 5.959]),
    (7, [0.711, 0.896, 1.119, 1.415, 1.895, 2.365, 2.998, 3.499, 4.785, 5.408]),
    (8, [0.706, 0.889, 1.108, 1.397, 1.860, 2.306, 2.896, 3.355, 4.501, 5.041]),
    (9, [0.703, 0.883, 1.100, 1.383, 1.833, 2.262, 2.821, 3.250, 4.297, 4.781]),
    (10, [0.700, 0.879, 1.093, 1.372, 1.812, 2.228, 2.764, 3.169, 4.144, 4.587]),
    (11, [0.697, 0.876, 1.088, 1.363, 1.796, 2.201, 2.718, 3.106, 4.025, 4.437]),
    (12, [0.695, 0.873, 1.083, 1.356, 1.782, 2.179, 2.681, 3.055, 3.930, 4.318]),
    (13, [0.694, 0.870, 1.079, 1.350, 1.771, 2.160, 2.650, 3.012, 3.852, 4.221]),
    (14, [0.692, 0.868, 1.076, 1.345, 1.761, 2.145, 2.624, 2.977, 3.787, 4.140]),
    (15, [0.691, 0.866, 1.074, 1.341, 1.753, 2.131, 2.602, 2.947, 3.733, 4.073]),
    (16, [0.690, 0.865, 1.071, 1.337, 1.746, 2.120, 2.583, 2.921, 3.686, 4.015]),
    (17, [0.689, 0.863, 1.069, 1.333, 1.740, 2.110, 2.567, 2.898, 3.646, 3.965]),
    (18, [0.688, 0.862, 1.067, 1.330, 1.734, 2.101, 2.552, 2.878, 3.610, 3.922]),
    (19, [0.688, 0.861, 1.066, 1.328, 1.729, 2.093, 2.539, 2.861, 3.579, 3.883]),
    (20, [0.687, 0.860, 1.064, 1.325, 1.725, 2.086, 2.528, 2.845, 3.552, 3.850]),
    (21, [0.686, 0.859, 1.063, 1.323, 1.721, 2.080, 2.518, 2.831, 3.527, 3.819]),
    (22, [0.686, 0.858, 1.061, 1.321, 1.717, 2.074, 2.508, 2.819, 3.505, 3.792]),
    (23, [0.685, 0.858, 1.060, 1.319, 1.714, 2.069, 2.500, 2.807, 3.485, 3.767]),
    (24, [0.685, 0.857, 1.059, 1.318, 1.711, 2.064, 2.492, 2.797, 3.467, 3.745]),
    (25, [0.684, 0.856, 1.058, 1.316, 1.708, 2.060, 2.485, 2.787, 3.450, 3.725]),
    (26, [0.684, 0.856, 1.058, 1.315, 1.706, 2.056, 2.479, 2.779, 3.435, 3.707]),
    (27, [0.684, 0.855, 1.057, 1.314, 1.703, 2.052, 2.473, 2.771, 3.421, 3.690]),
    (28, [0.683, 0.855, 1.056, 1.313, 1.701, 2.048, 2.467, 2.763, 3.408, 3.674]),
    (29, [0.683, 0.854, 1.055, 1.311, 1.699, 2.045, 2.462, 2.756, 3.396, 3.659]),
    (30, [0.683, 0.854, 1.055, 1.310, 1.697, 2.042, 2.457, 2.750, 3.385, 3.646]),
    (40, [0.681, 0.851, 1.050, 1.303, 1.684, 2.021, 2.423, 2.704, 3.307, 3.551]),
    (60, [0.679, 0.848, 1.045, 1.296, 1.671, 2.000, 2.390, 2.660, 3.232, 3.460]),
    (80, [0.678, 0.846, 1.043, 1.292, 1.664, 1.990, 2.374, 2.639, 3.195, 3.416]),
    (100, [0.677, 0.845, 1.042, 1.290, 1.660, 1.984, 2.364, 2.626, 3.174, 3.390]),
    (1000, [0.675, 0.842, 1.037, 1.282, 1.646, 1.962, 2.330, 2.581, 3.098, 3.300]),
    (DF_INFINITY, [0.674, 0.842, 1.036, 1.282, 1.645, 1.960, 2.326, 2.576, 3.090, 3.291]),
];

/// Critical t value for `df` degrees of freedom at the given confidence.
///
/// Uses the first row whose degrees of freedom are `>= df`, i.e. rounds up to
/// the next tabulated bucket.
pub fn t_score(df: u64, confidence: ConfidenceLevel) -> Result<f64, StatsError> {
    if df == 0 {
        return Err(StatsError::InsufficientSamples { got: 1, need: 2 });
    }

    let Some(column) = confidence.column() else {
        return Ok(0.0);
    };

    let (_, values) = T_TABLE
        .iter()
        .find(|(row_df, _)| *row_df >= df)
        .unwrap_or(&T_TABLE[T_TABLE.len() - 1]);

    Ok(values[column])
}

/// Half-width of the confidence interval around the mean:
/// `standard_error * t_score(n - 1, confidence)`.
pub fn margin_of_error(samples: &[f64], confidence: ConfidenceLevel) -> Result<f64, StatsError> {
    let se = standard_error(samples)?;
    let t = t_score(samples.len() as u64 - 1, confidence)?;
    Ok(se * t)
}

/// Minimum total duration a measurement must span so that one unit of clock
/// resolution contributes at most `fraction_of_uncertainty` to the result.
pub fn reduce_uncertainty(smallest_measurable_unit: f64, fraction_of_uncertainty: f64) -> f64 {
    (smallest_measurable_unit / 2.0) / fraction_of_uncertainty
}
