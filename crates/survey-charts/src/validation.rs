//! Chart type compatibility and sample-size checks.

use crate::config::SampleSizeThresholds;
use crate::types::{ChartType, ColumnType, Incompatibility};
use std::collections::BTreeSet;

/// Chart types that are statistically meaningful for the given X/Y types.
///
/// | X \ Y        | none                   | numeric                 | categorical | date    |
/// |--------------|------------------------|-------------------------|-------------|---------|
/// | numeric      | histogram, bar, line, box | scatter, line, bar, box | scatter  | scatter |
/// | categorical  | bar                    | bar, box, scatter       | scatter     | scatter |
/// | date         | bar, line              | line, bar, scatter      | scatter     | scatter |
/// | other        | -                      | -                       | -           | -       |
pub fn valid_types(x: ColumnType, y: Option<ColumnType>) -> BTreeSet<ChartType> {
    use ChartType::*;
    use ColumnType as T;

    let types: &[ChartType] = match (x, y) {
        (T::Other, _) | (_, Some(T::Other)) => &[],

        (T::Numeric, None) => &[Histogram, Bar, Line, Box],
        (T::Numeric, Some(T::Numeric)) => &[Scatter, Line, Bar, Box],

        (T::Categorical, None) => &[Bar],
        (T::Categorical, Some(T::Numeric)) => &[Bar, Box, Scatter],

        (T::Date, None) => &[Bar, Line],
        (T::Date, Some(T::Numeric)) => &[Line, Bar, Scatter],

        (_, Some(T::Categorical)) | (_, Some(T::Date)) => &[Scatter],
    };

    types.iter().copied().collect()
}

/// `Err` with a structured rejection when `chart_type` is not valid for the
/// X/Y types.
pub fn check_compatibility(
    chart_type: ChartType,
    x: ColumnType,
    y: Option<ColumnType>,
) -> Result<(), Incompatibility> {
    let valid = valid_types(x, y);
    if valid.contains(&chart_type) {
        return Ok(());
    }

    let pair = match y {
        Some(y) => format!("X {x} / Y {y}"),
        None => format!("X {x} without Y"),
    };
    let reason = if valid.is_empty() {
        format!("No chart type can display {pair}")
    } else {
        let names: Vec<&str> = valid.iter().map(|t| t.as_str()).collect();
        format!(
            "A {chart_type} chart cannot display {pair}; valid chart types: {}",
            names.join(", ")
        )
    };

    Err(Incompatibility {
        chart_type,
        x_type: x,
        y_type: y,
        valid_types: valid.into_iter().collect(),
        reason,
    })
}

/// Warnings for groups (or whole charts) below the per-chart sample-size
/// thresholds. `groups` holds `(label, n)` in emission order.
pub fn check_sample_size(
    chart_type: ChartType,
    groups: &[(String, usize)],
    thresholds: &SampleSizeThresholds,
) -> Vec<String> {
    let total: usize = groups.iter().map(|(_, n)| n).sum();
    let mut warnings = Vec::new();

    match chart_type {
        ChartType::Histogram => {
            if total < thresholds.histogram_min {
                warnings.push(format!(
                    "Only {total} values: a histogram is unreliable below {}",
                    thresholds.histogram_min
                ));
            } else if total < thresholds.histogram_warn {
                warnings.push(format!(
                    "Small sample ({total} values): histogram shape may be unstable below {}",
                    thresholds.histogram_warn
                ));
            }
        }
        ChartType::Scatter => {
            if total < thresholds.scatter_min {
                warnings.push(format!(
                    "Only {total} points: a scatter plot is unreliable below {}",
                    thresholds.scatter_min
                ));
            } else if total < thresholds.scatter_warn {
                warnings.push(format!(
                    "Small sample ({total} points): correlations may be unstable below {}",
                    thresholds.scatter_warn
                ));
            }
        }
        ChartType::Box => {
            for (label, n) in groups {
                if *n < thresholds.box_min {
                    warnings.push(format!(
                        "Group '{label}' has only {n} values: box statistics are unreliable below {}",
                        thresholds.box_min
                    ));
                } else if *n < thresholds.box_warn {
                    warnings.push(format!(
                        "Group '{label}' has {n} values: quartiles may be unstable below {}",
                        thresholds.box_warn
                    ));
                }
            }
        }
        ChartType::Bar => {
            for (label, n) in groups {
                if *n < thresholds.bar_warn {
                    warnings.push(format!(
                        "Group '{label}' has only {n} observations (below {})",
                        thresholds.bar_warn
                    ));
                }
            }
        }
        ChartType::Line => {
            let periods = groups.len();
            if periods < thresholds.periods_min {
                warnings.push(format!(
                    "Only {periods} points in the series: a trend needs at least {}",
                    thresholds.periods_min
                ));
            } else if periods < thresholds.periods_warn {
                warnings.push(format!(
                    "Only {periods} points in the series: trends are unreliable below {}",
                    thresholds.periods_warn
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(ns: &[usize]) -> Vec<(String, usize)> {
        ns.iter()
            .enumerate()
            .map(|(i, n)| (format!("g{i}"), *n))
            .collect()
    }

    // ==================== valid_types tests ====================

    #[test]
    fn test_numeric_x_alone() {
        let valid = valid_types(ColumnType::Numeric, None);
        assert!(valid.contains(&ChartType::Histogram));
        assert!(valid.contains(&ChartType::Box));
        assert!(!valid.contains(&ChartType::Scatter));
    }

    #[test]
    fn test_categorical_x_numeric_y() {
        let valid: Vec<ChartType> =
            valid_types(ColumnType::Categorical, Some(ColumnType::Numeric))
                .into_iter()
                .collect();
        assert_eq!(valid, vec![ChartType::Bar, ChartType::Scatter, ChartType::Box]);
    }

    #[test]
    fn test_histogram_needs_numeric_x() {
        assert!(!valid_types(ColumnType::Categorical, None).contains(&ChartType::Histogram));
        assert!(!valid_types(ColumnType::Date, None).contains(&ChartType::Histogram));
    }

    #[test]
    fn test_other_columns_allow_nothing() {
        assert!(valid_types(ColumnType::Other, None).is_empty());
        assert!(valid_types(ColumnType::Numeric, Some(ColumnType::Other)).is_empty());
    }

    #[test]
    fn test_non_numeric_y_allows_only_scatter() {
        for x in [ColumnType::Numeric, ColumnType::Categorical, ColumnType::Date] {
            for y in [ColumnType::Categorical, ColumnType::Date] {
                let valid: Vec<ChartType> = valid_types(x, Some(y)).into_iter().collect();
                assert_eq!(valid, vec![ChartType::Scatter]);
            }
        }
    }

    // ==================== check_compatibility tests ====================

    #[test]
    fn test_rejection_lists_valid_types() {
        let rejection =
            check_compatibility(ChartType::Histogram, ColumnType::Categorical, None).unwrap_err();
        assert_eq!(rejection.valid_types, vec![ChartType::Bar]);
        assert!(rejection.reason.contains("histogram"));
        assert!(rejection.reason.contains("bar"));
    }

    #[test]
    fn test_compatible_selection_passes() {
        assert!(
            check_compatibility(ChartType::Line, ColumnType::Date, Some(ColumnType::Numeric))
                .is_ok()
        );
    }

    // ==================== check_sample_size tests ====================

    #[test]
    fn test_bar_warns_per_small_group() {
        let warnings = check_sample_size(
            ChartType::Bar,
            &groups(&[10, 2, 1]),
            &SampleSizeThresholds::default(),
        );
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'g1'"));
        assert!(warnings[1].contains("'g2'"));
    }

    #[test]
    fn test_histogram_thresholds_use_total() {
        let t = SampleSizeThresholds::default();
        assert_eq!(check_sample_size(ChartType::Histogram, &groups(&[4, 4]), &t).len(), 1);
        assert!(check_sample_size(ChartType::Histogram, &groups(&[4, 4]), &t)[0]
            .contains("unreliable"));
        assert!(check_sample_size(ChartType::Histogram, &groups(&[10, 10]), &t)[0]
            .contains("Small sample"));
        assert!(check_sample_size(ChartType::Histogram, &groups(&[20, 20]), &t).is_empty());
    }

    #[test]
    fn test_box_thresholds_per_group() {
        let t = SampleSizeThresholds::default();
        let warnings = check_sample_size(ChartType::Box, &groups(&[3, 7, 12]), &t);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("unreliable"));
        assert!(warnings[1].contains("unstable"));
    }

    #[test]
    fn test_line_counts_periods() {
        let t = SampleSizeThresholds::default();
        assert_eq!(check_sample_size(ChartType::Line, &groups(&[50, 50]), &t).len(), 1);
        assert_eq!(check_sample_size(ChartType::Line, &groups(&[1, 1, 1, 1]), &t).len(), 1);
        assert!(check_sample_size(ChartType::Line, &groups(&[1; 5]), &t).is_empty());
    }

    #[test]
    fn test_scatter_thresholds() {
        let t = SampleSizeThresholds::default();
        assert_eq!(check_sample_size(ChartType::Scatter, &groups(&[5]), &t).len(), 1);
        assert!(check_sample_size(ChartType::Scatter, &groups(&[25]), &t).is_empty());
    }
}
