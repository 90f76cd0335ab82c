//! Equal-width binning of numeric samples.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};

/// One bin of a [`BinLayout`].
///
/// `lower` and `upper` are the exact edges used for membership. The last bin's
/// `upper` is the sample maximum itself, not `center + width / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub center: f64,
    pub width: f64,
    pub lower: f64,
    pub upper: f64,
    pub index: usize,
}

impl Bin {
    pub fn is_last_of(&self, layout: &BinLayout) -> bool {
        self.index + 1 == layout.len()
    }

    /// Half-open membership test; the last bin is also closed at the top.
    pub fn contains(&self, value: f64, last: bool) -> bool {
        value >= self.lower && (value < self.upper || (last && value == self.upper))
    }
}

/// Bin centers and width for a numeric sample.
///
/// Value `v` belongs to bin `i` when `lower_i <= v < upper_i`; the last bin is
/// closed on both ends so the sample maximum is always covered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinLayout {
    /// Bin centers, ascending.
    pub bins: Vec<f64>,
    pub bin_width: f64,
    /// Inclusive bounds of the covered range.
    pub lower: f64,
    pub upper: f64,
}

impl BinLayout {
    fn empty() -> Self {
        Self {
            bins: Vec::new(),
            bin_width: 1.0,
            lower: 0.0,
            upper: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Lower edge of bin `index`. Edge `len()` is the covered upper bound.
    fn edge(&self, index: usize) -> f64 {
        if index == 0 {
            self.lower
        } else if index >= self.bins.len() {
            self.upper
        } else {
            self.lower + self.bin_width * index as f64
        }
    }

    pub fn bin(&self, index: usize) -> Option<Bin> {
        self.bins.get(index).map(|&center| Bin {
            center,
            width: self.bin_width,
            lower: self.edge(index),
            upper: self.edge(index + 1),
            index,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Bin> + '_ {
        (0..self.bins.len()).filter_map(|i| self.bin(i))
    }

    /// Index of the bin containing `value`, `None` outside the covered range
    /// or for non-finite input.
    pub fn bin_index_of(&self, value: f64) -> Option<usize> {
        if self.bins.is_empty() || !value.is_finite() {
            return None;
        }
        if value < self.lower || value > self.upper {
            return None;
        }
        let last = self.bins.len() - 1;
        let raw = ((value - self.lower) / self.bin_width).floor();
        let mut index = if raw < 0.0 { 0 } else { (raw as usize).min(last) };

        // Division can land one bin off near an edge; settle against the edges
        while index > 0 && value < self.edge(index) {
            index -= 1;
        }
        while index < last && value >= self.edge(index + 1) {
            index += 1;
        }
        Some(index)
    }

    pub fn bin_of(&self, value: f64) -> Option<Bin> {
        self.bin_index_of(value).and_then(|i| self.bin(i))
    }
}

/// Partition `values` into `bin_count` equal-width bins.
///
/// Non-finite values are ignored. A zero-spread sample yields one bin centered
/// on the value with nominal width 1. An empty sample yields no bins.
pub fn bin_numeric(values: &[f64], bin_count: usize) -> Result<BinLayout> {
    if bin_count == 0 {
        return Err(ChartError::InvalidBinCount(bin_count));
    }

    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return Ok(BinLayout::empty());
    }

    if min == max {
        return Ok(BinLayout {
            bins: vec![min],
            bin_width: 1.0,
            lower: min - 0.5,
            upper: min + 0.5,
        });
    }

    let width = (max - min) / bin_count as f64;
    let bins = (0..bin_count)
        .map(|i| min + width * (i as f64 + 0.5))
        .collect();

    Ok(BinLayout {
        bins,
        bin_width: width,
        lower: min,
        upper: max,
    })
}

/// A "nice" slider step for the range `[min, max]`.
///
/// Integer bounds with an integer midpoint and a span of at most 100 step by
/// 1. Otherwise the span is split into roughly 100 steps and rounded up to
/// 1, 2 or 5 times a power of ten.
pub fn compute_nice_step(min: f64, max: f64) -> f64 {
    if !min.is_finite() || !max.is_finite() || max <= min {
        return 1.0;
    }

    let range = max - min;
    let midpoint = (min + max) / 2.0;
    let is_int = |v: f64| v.fract() == 0.0;
    if is_int(min) && is_int(max) && is_int(midpoint) && range <= 100.0 {
        return 1.0;
    }

    let rough = range / 100.0;
    let magnitude = 10f64.powf(rough.log10().floor());
    let normalized = rough / magnitude;
    let nice = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .find(|&n| n >= normalized)
        .unwrap_or(10.0);
    nice * magnitude
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== bin_numeric tests ====================

    #[test]
    fn test_centers_and_width() {
        let layout = bin_numeric(&[0.0, 10.0], 5).unwrap();
        assert_eq!(layout.bin_width, 2.0);
        assert_eq!(layout.bins, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_zero_bins_is_an_error() {
        let err = bin_numeric(&[1.0, 2.0], 0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_BIN_COUNT");
    }

    #[test]
    fn test_degenerate_sample_single_bin() {
        let layout = bin_numeric(&[4.0, 4.0, 4.0], 10).unwrap();
        assert_eq!(layout.bins, vec![4.0]);
        assert_eq!(layout.bin_width, 1.0);
        assert_eq!(layout.bin_index_of(4.0), Some(0));
    }

    #[test]
    fn test_empty_sample_has_no_bins() {
        let layout = bin_numeric(&[], 10).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.bin_index_of(1.0), None);

        let only_nan = bin_numeric(&[f64::NAN], 3).unwrap();
        assert!(only_nan.is_empty());
    }

    #[test]
    fn test_last_bin_includes_maximum() {
        let layout = bin_numeric(&[0.0, 10.0], 5).unwrap();
        assert_eq!(layout.bin_index_of(10.0), Some(4));
        assert_eq!(layout.bin_index_of(0.0), Some(0));
        // interior edges belong to the upper bin
        assert_eq!(layout.bin_index_of(2.0), Some(1));
        assert_eq!(layout.bin_index_of(10.5), None);
        assert_eq!(layout.bin_index_of(-0.1), None);
    }

    fn assert_single_membership(values: &[f64], bins: usize) {
        let layout = bin_numeric(values, bins).unwrap();
        for &v in values {
            let index = layout.bin_index_of(v).expect("value covered");
            let holders: Vec<usize> = layout
                .iter()
                .filter(|b| b.contains(v, b.is_last_of(&layout)))
                .map(|b| b.index)
                .collect();
            assert_eq!(holders, vec![index], "value {v} with {bins} bins");
        }
    }

    #[test]
    fn test_every_value_falls_in_exactly_one_bin() {
        let values: Vec<f64> = (0..97).map(|i| (i as f64 * 1.37).sin() * 50.0 + 3.3).collect();
        for bins in [1, 2, 3, 7, 20, 64] {
            assert_single_membership(&values, bins);
        }
    }

    #[test]
    fn test_sample_maximum_sits_inside_last_bin_edges() {
        for seed in 0..500u32 {
            let values: Vec<f64> = (0..50)
                .map(|i| ((seed * 50 + i) as f64 * 0.731).sin() * 40.0)
                .collect();
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for bins in [3, 7, 10, 13] {
                let layout = bin_numeric(&values, bins).unwrap();
                let last = layout.bin(layout.len() - 1).unwrap();
                assert_eq!(last.upper, max);
                assert_eq!(layout.bin(0).unwrap().lower, layout.lower);
                assert_single_membership(&values, bins);
            }
        }
    }

    #[test]
    fn test_adjacent_bins_share_edges() {
        let layout = bin_numeric(&[0.1, 0.7, 3.3], 7).unwrap();
        let bins: Vec<Bin> = layout.iter().collect();
        for pair in bins.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
        }
    }

    // ==================== compute_nice_step tests ====================

    #[test]
    fn test_integer_ranges_step_by_one() {
        assert_eq!(compute_nice_step(0.0, 100.0), 1.0);
        assert_eq!(compute_nice_step(18.0, 80.0), 1.0);
    }

    #[test]
    fn test_fractional_and_wide_ranges() {
        assert!((compute_nice_step(0.0, 1.0) - 0.01).abs() < 1e-12);
        assert!((compute_nice_step(0.0, 2.5) - 0.05).abs() < 1e-12);
        assert!((compute_nice_step(0.0, 1000.0) - 10.0).abs() < 1e-9);
        assert!((compute_nice_step(0.0, 3000.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_range_step() {
        assert_eq!(compute_nice_step(5.0, 5.0), 1.0);
        assert_eq!(compute_nice_step(f64::NAN, 1.0), 1.0);
    }

    #[test]
    fn test_nice_step_is_deterministic() {
        assert_eq!(compute_nice_step(0.3, 7.9), compute_nice_step(0.3, 7.9));
    }
}
