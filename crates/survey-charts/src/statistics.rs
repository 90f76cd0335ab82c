//! Box-plot summaries and mean confidence intervals.
//!
//! Quartiles use the nearest-rank method, `sorted[floor(n * p)]`, without
//! interpolation. This differs from the interpolated definition many plotting
//! libraries use, so precomputed boxes can differ slightly from a renderer's
//! own computation on the same sample.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};

/// Five-number summary with outliers beyond the 1.5 IQR fence.
///
/// `min` and `max` are the most extreme inliers, not the sample extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub outliers: Vec<f64>,
    pub n: usize,
}

impl BoxStats {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Median of an ascending slice. Even-sized slices average the two middle
/// values.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    median_sorted(&sorted_finite(values))
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Box statistics for `values`, `None` when no finite value remains.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let sorted = sorted_finite(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }

    let q1 = sorted[(n as f64 * 0.25) as usize];
    let q3 = sorted[((n as f64 * 0.75) as usize).min(n - 1)];
    let median = median_sorted(&sorted)?;

    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let (inliers, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .copied()
        .partition(|&v| v >= lower_fence && v <= upper_fence);

    // q1 and q3 are sample values inside the fence, so inliers is never empty
    let min = inliers.first().copied().unwrap_or(q1);
    let max = inliers.last().copied().unwrap_or(q3);

    Some(BoxStats {
        min,
        q1,
        median,
        q3,
        max,
        outliers,
        n,
    })
}

// ============================================================================
// Confidence intervals
// ============================================================================

/// Mean with two-sided confidence bounds.
///
/// `computable` is false when fewer than two values are available; bounds are
/// then absent instead of collapsing to a zero-width interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub mean: Option<f64>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub n: usize,
    pub computable: bool,
}

impl ConfidenceInterval {
    pub fn bounds(&self) -> Option<[f64; 2]> {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => Some([lower, upper]),
            _ => None,
        }
    }
}

const SUPPORTED_LEVELS: [f64; 3] = [0.90, 0.95, 0.99];

const T_TABLE_DF: [u32; 33] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26,
    27, 28, 29, 30, 40, 60, 120,
];

const T_90: [f64; 33] = [
    6.314, 2.920, 2.353, 2.132, 2.015, 1.943, 1.895, 1.860, 1.833, 1.812, 1.796, 1.782, 1.771,
    1.761, 1.753, 1.746, 1.740, 1.734, 1.729, 1.725, 1.721, 1.717, 1.714, 1.711, 1.708, 1.706,
    1.703, 1.701, 1.699, 1.697, 1.684, 1.671, 1.658,
];

const T_95: [f64; 33] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, 2.201, 2.179, 2.160,
    2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, 2.080, 2.074, 2.069, 2.064, 2.060, 2.056,
    2.052, 2.048, 2.045, 2.042, 2.021, 2.000, 1.980,
];

const T_99: [f64; 33] = [
    63.657, 9.925, 5.841, 4.604, 4.032, 3.707, 3.499, 3.355, 3.250, 3.169, 3.106, 3.055, 3.012,
    2.977, 2.947, 2.921, 2.898, 2.878, 2.861, 2.845, 2.831, 2.819, 2.807, 2.797, 2.787, 2.779,
    2.771, 2.763, 2.756, 2.750, 2.704, 2.660, 2.617,
];

/// Normal quantiles used past df = 1000.
const Z_90: f64 = 1.645;
const Z_95: f64 = 1.960;
const Z_99: f64 = 2.576;

pub fn is_supported_confidence_level(level: f64) -> bool {
    SUPPORTED_LEVELS.iter().any(|l| (l - level).abs() < 1e-9)
}

/// Two-sided Student t critical value.
///
/// Degrees of freedom between tabulated rows use the next lower row, which
/// gives a slightly wider (conservative) interval.
pub fn t_critical(df: u32, level: f64) -> Result<f64> {
    let (table, z) = if (level - 0.90).abs() < 1e-9 {
        (&T_90, Z_90)
    } else if (level - 0.95).abs() < 1e-9 {
        (&T_95, Z_95)
    } else if (level - 0.99).abs() < 1e-9 {
        (&T_99, Z_99)
    } else {
        return Err(ChartError::UnsupportedConfidenceLevel(level));
    };

    if df == 0 {
        return Err(ChartError::InvalidConfig(
            "t critical value needs at least one degree of freedom".to_string(),
        ));
    }
    if df > 1000 {
        return Ok(z);
    }

    let row = T_TABLE_DF.iter().rposition(|&d| d <= df).unwrap_or(0);
    Ok(table[row])
}

/// Mean and `level` confidence interval using the sample standard error and
/// a t critical value with `n - 1` degrees of freedom.
pub fn mean_confidence_interval(values: &[f64], level: f64) -> Result<ConfidenceInterval> {
    if !is_supported_confidence_level(level) {
        return Err(ChartError::UnsupportedConfidenceLevel(level));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    let mean = mean(&finite);

    if n <= 1 {
        return Ok(ConfidenceInterval {
            mean,
            lower: None,
            upper: None,
            n,
            computable: false,
        });
    }

    let m = mean.unwrap_or(0.0);
    let variance = finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_err = variance.sqrt() / (n as f64).sqrt();
    let t = t_critical((n - 1) as u32, level)?;
    let half_width = t * std_err;

    Ok(ConfidenceInterval {
        mean,
        lower: Some(m - half_width),
        upper: Some(m + half_width),
        n,
        computable: true,
    })
}
