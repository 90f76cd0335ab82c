//! Line / time-series chart: the bar pipeline, drawn as connected points in
//! X order.

use super::{ChartContext, ChartStrategy, grouped_spec};
use crate::error::Result;
use crate::types::{ChartSpec, ChartType, SeriesKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct LineChart;

impl ChartStrategy for LineChart {
    fn chart_type(&self) -> ChartType {
        ChartType::Line
    }

    fn build(&self, ctx: &ChartContext<'_>) -> Result<ChartSpec> {
        grouped_spec(ctx, ChartType::Line, SeriesKind::Line)
    }
}

#[cfg(test)]
mod tests {
    use crate::charts::ChartSpecBuilder;
    use crate::dataset::Row;
    use crate::profiler::DatasetProfile;
    use crate::types::{
        Aggregation, ChartConfig, ChartOutcome, ChartType, ColumnType, Datum, Period, SeriesKind,
    };

    fn weekly_rows() -> Vec<Row> {
        [
            ("2023-06-14", "10"),
            ("2023-06-12", "20"),
            ("2023-06-18", "30"),
            ("2023-06-19", "5"),
            ("2023-06-26", "7"),
            ("1999-01-01", "1000"),
        ]
        .iter()
        .map(|(date, titer)| Row::new().with("sample_date", *date).with("titer", *titer))
        .collect()
    }

    fn profile() -> DatasetProfile {
        DatasetProfile::from_types([
            ("sample_date", ColumnType::Date),
            ("titer", ColumnType::Numeric),
            ("site", ColumnType::Categorical),
        ])
    }

    fn build(chart: &ChartConfig) -> ChartOutcome {
        let rows = weekly_rows();
        let refs: Vec<&Row> = rows.iter().collect();
        ChartSpecBuilder::default().build(&refs, &profile(), chart).unwrap()
    }

    #[test]
    fn test_weekly_mean_series() {
        let chart = ChartConfig::new("sample_date", ChartType::Line)
            .with_y("titer")
            .with_aggregation(Aggregation::Mean)
            .with_period(Period::Week);
        let spec = build(&chart).into_spec().unwrap();
        let series = &spec.series[0];

        assert_eq!(series.kind, SeriesKind::Line);
        assert_eq!(
            series.x,
            vec![
                Datum::Text("2023-06-12".into()),
                Datum::Text("2023-06-19".into()),
                Datum::Text("2023-06-26".into()),
            ]
        );
        assert_eq!(
            series.y,
            vec![Datum::Number(20.0), Datum::Number(5.0), Datum::Number(7.0)]
        );
        // out-of-window date is dropped and reported
        assert!(spec.warnings.iter().any(|w| w.starts_with("1 rows")));
        // three periods is below the soft threshold of five
        assert!(spec.warnings.iter().any(|w| w.contains("trends are unreliable")));
    }

    #[test]
    fn test_line_over_categories_is_rejected() {
        let chart = ChartConfig::new("site", ChartType::Line);
        match build(&chart) {
            ChartOutcome::Rejected(rejection) => {
                assert_eq!(rejection.valid_types, vec![ChartType::Bar]);
            }
            ChartOutcome::Rendered(_) => panic!("line over categories must be rejected"),
        }
    }
}
