//! Bar chart: one bar per category, bin, or period.

use super::{ChartContext, ChartStrategy, grouped_spec};
use crate::error::Result;
use crate::types::{ChartSpec, ChartType, SeriesKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct BarChart;

impl ChartStrategy for BarChart {
    fn chart_type(&self) -> ChartType {
        ChartType::Bar
    }

    fn build(&self, ctx: &ChartContext<'_>) -> Result<ChartSpec> {
        grouped_spec(ctx, ChartType::Bar, SeriesKind::Bar)
    }
}

#[cfg(test)]
mod tests {
    use crate::charts::ChartSpecBuilder;
    use crate::dataset::Row;
    use crate::profiler::DatasetProfile;
    use crate::types::{Aggregation, ChartConfig, ChartSpec, ChartType, ColumnType, Datum, Period};
    use pretty_assertions::assert_eq;

    fn build(rows: &[Row], profile: &DatasetProfile, chart: &ChartConfig) -> ChartSpec {
        let refs: Vec<&Row> = rows.iter().collect();
        ChartSpecBuilder::default()
            .build(&refs, profile, chart)
            .unwrap()
            .into_spec()
            .unwrap()
    }

    fn income_row(group: &str, income: &str) -> Row {
        Row::new().with("age_group", group).with("income", income)
    }

    fn income_rows() -> Vec<Row> {
        vec![
            income_row("18-29", "1000 bis unter 2000 Euro"),
            income_row("18-29", "2000 bis unter 3000 Euro"),
            income_row("30-39", "8000 Euro und mehr"),
        ]
    }

    fn income_profile() -> DatasetProfile {
        DatasetProfile::from_types([
            ("age_group", ColumnType::Categorical),
            ("income", ColumnType::Numeric),
        ])
    }

    #[test]
    fn test_mean_income_by_age_group() {
        let chart = ChartConfig::new("age_group", ChartType::Bar)
            .with_y("income")
            .with_aggregation(Aggregation::Mean);
        let spec = build(&income_rows(), &income_profile(), &chart);
        let series = &spec.series[0];

        assert_eq!(series.x, vec![Datum::Text("18-29".into()), Datum::Text("30-39".into())]);
        assert_eq!(series.y, vec![Datum::Number(2000.0), Datum::Number(12000.0)]);
        assert_eq!(series.counts, Some(vec![2, 1]));
        assert_eq!(series.label, "Mean of income");
        assert!(spec.warnings.iter().any(|w| w.contains("'30-39'")));
    }

    #[test]
    fn test_missing_y_forces_count() {
        let chart =
            ChartConfig::new("age_group", ChartType::Bar).with_aggregation(Aggregation::Mean);
        let spec = build(&income_rows(), &income_profile(), &chart);
        assert_eq!(spec.series[0].y, vec![Datum::Number(2.0), Datum::Number(1.0)]);
        assert_eq!(spec.y_axis.title, "Count");
    }

    #[test]
    fn test_unusable_values_flag_group() {
        let rows = vec![
            income_row("18-29", "keine Ahnung"),
            income_row("30-39", "500"),
        ];
        let chart = ChartConfig::new("age_group", ChartType::Bar)
            .with_y("income")
            .with_aggregation(Aggregation::Mean);
        let spec = build(&rows, &income_profile(), &chart);
        assert_eq!(spec.series[0].y[0], Datum::Null);
        assert!(spec.warnings.iter().any(|w| w.contains("Group '18-29' has no usable 'income'")));
        assert!(spec.warnings.iter().any(|w| w.contains("1 non-numeric")));
    }

    #[test]
    fn test_confidence_bounds_for_mean() {
        let mut rows = income_rows();
        rows.push(income_row("18-29", "3000 bis unter 4000 Euro"));
        let chart = ChartConfig::new("age_group", ChartType::Bar)
            .with_y("income")
            .with_aggregation(Aggregation::Mean)
            .with_confidence(true);
        let spec = build(&rows, &income_profile(), &chart);
        let bounds = spec.series[0].confidence.as_ref().unwrap();
        // 18-29: values 1500, 2500, 3500 -> mean 2500, se 577.35, t(2) 4.303
        let [lower, upper] = bounds[0].unwrap();
        assert!((upper - lower - 2.0 * 4.303 * 1000.0 / 3f64.sqrt()).abs() < 1e-6);
        assert_eq!(bounds[1], None);
        assert!(spec.warnings.iter().any(|w| w.contains("no confidence interval")));
    }

    #[test]
    fn test_date_bars_by_quarter() {
        let rows: Vec<Row> = ["2021-11-03", "2021-02-10", "2022-01-05", "2021-03-30", "garbage"]
            .iter()
            .map(|d| Row::new().with("sample_date", *d))
            .collect();
        let profile = DatasetProfile::from_types([("sample_date", ColumnType::Date)]);
        let chart = ChartConfig::new("sample_date", ChartType::Bar).with_period(Period::Quarter);
        let spec = build(&rows, &profile, &chart);
        assert_eq!(
            spec.series[0].x,
            vec![
                Datum::Text("Q1 2021".into()),
                Datum::Text("Q4 2021".into()),
                Datum::Text("Q1 2022".into()),
            ]
        );
        assert_eq!(spec.series[0].counts, Some(vec![2, 1, 1]));
        assert_eq!(spec.x_axis.title, "sample_date (quarter)");
        assert!(spec.warnings.iter().any(|w| w.contains("1 rows without a usable 'sample_date'")));
    }

    #[test]
    fn test_numeric_x_is_binned() {
        let rows: Vec<Row> = ["1", "2", "9", "10"]
            .iter()
            .map(|v| Row::new().with("score", *v))
            .collect();
        let profile = DatasetProfile::from_types([("score", ColumnType::Numeric)]);
        let chart = ChartConfig::new("score", ChartType::Bar).with_bins(3);
        let spec = build(&rows, &profile, &chart);
        assert_eq!(spec.series[0].x, vec![Datum::Number(2.5), Datum::Number(8.5)]);
        assert_eq!(spec.series[0].counts, Some(vec![2, 2]));
    }
}
