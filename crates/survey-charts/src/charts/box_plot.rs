//! Box plot: one precomputed five-number summary per category or bin, or a
//! single box of X when no Y is selected.

use super::{ChartContext, ChartStrategy};
use crate::error::Result;
use crate::statistics::{BoxStats, box_stats};
use crate::types::{Aggregation, AxisSpec, ChartSpec, ChartType, Datum, SeriesKind, SeriesSpec};
use crate::validation::check_sample_size;

#[derive(Debug, Clone, Copy, Default)]
pub struct BoxChart;

impl BoxChart {
    fn single_box(ctx: &ChartContext<'_>) -> Result<ChartSpec> {
        let x = ctx.x_field();
        let coercion = ctx.coerce_column(x);
        let mut warnings: Vec<String> = coercion.diagnostic(x).into_iter().collect();

        let mut series = SeriesSpec::new(SeriesKind::Box, x);
        let mut boxes = Vec::new();
        let mut sizes = Vec::new();
        match box_stats(&coercion.values) {
            Some(stats) => {
                series.x.push(Datum::Text(x.to_string()));
                series.y.push(Datum::Number(stats.median));
                sizes.push((x.to_string(), stats.n));
                boxes.push(stats);
            }
            None => warnings.push(format!("No numeric values in '{x}' to summarize")),
        }

        Ok(finish(ctx, series, boxes, sizes, warnings, AxisSpec::titled(""), AxisSpec::titled(x)))
    }

    fn grouped_boxes(ctx: &ChartContext<'_>, y: &str) -> Result<ChartSpec> {
        let (_, result) = ctx.aggregate_by_x(Aggregation::Median)?;
        let mut warnings = Vec::new();
        if result.unkeyed > 0 {
            warnings.push(format!(
                "{} rows without a usable '{}' value were excluded",
                result.unkeyed,
                ctx.x_field()
            ));
        }
        if let Some(diagnostic) = ctx.coerce_column(y).diagnostic(y) {
            warnings.push(diagnostic);
        }

        let mut series = SeriesSpec::new(SeriesKind::Box, y);
        let mut boxes = Vec::new();
        let mut sizes = Vec::new();
        for group in &result.groups {
            let Some(stats) = box_stats(&group.values) else {
                warnings.push(format!(
                    "Group '{}' has no usable '{y}' values and is not shown",
                    group.key.label()
                ));
                continue;
            };
            series.x.push(group.key.datum());
            series.y.push(Datum::Number(stats.median));
            sizes.push((group.key.label(), stats.n));
            boxes.push(stats);
        }

        Ok(finish(ctx, series, boxes, sizes, warnings, ctx.x_axis(), AxisSpec::titled(y)))
    }
}

fn finish(
    ctx: &ChartContext<'_>,
    mut series: SeriesSpec,
    boxes: Vec<BoxStats>,
    sizes: Vec<(String, usize)>,
    mut warnings: Vec<String>,
    x_axis: AxisSpec,
    y_axis: AxisSpec,
) -> ChartSpec {
    series.counts = Some(sizes.iter().map(|(_, n)| *n).collect());
    series.boxes = Some(boxes);
    warnings.extend(check_sample_size(ChartType::Box, &sizes, &ctx.config.sample_size));

    ChartSpec {
        chart_type: ChartType::Box,
        series: vec![series],
        x_axis,
        y_axis,
        warnings,
    }
}

impl ChartStrategy for BoxChart {
    fn chart_type(&self) -> ChartType {
        ChartType::Box
    }

    fn build(&self, ctx: &ChartContext<'_>) -> Result<ChartSpec> {
        match ctx.y_field() {
            Some(y) => Self::grouped_boxes(ctx, y),
            None => Self::single_box(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartSpecBuilder;
    use crate::dataset::Row;
    use crate::profiler::DatasetProfile;
    use crate::types::{ChartConfig, ColumnType};
    use pretty_assertions::assert_eq;

    fn build(rows: &[Row], profile: &DatasetProfile, chart: &ChartConfig) -> ChartSpec {
        let refs: Vec<&Row> = rows.iter().collect();
        ChartSpecBuilder::default()
            .build(&refs, profile, chart)
            .unwrap()
            .into_spec()
            .unwrap()
    }

    #[test]
    fn test_single_box_flags_outlier() {
        let rows: Vec<Row> = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "100"]
            .iter()
            .map(|v| Row::new().with("titer", *v))
            .collect();
        let profile = DatasetProfile::from_types([("titer", ColumnType::Numeric)]);
        let spec = build(&rows, &profile, &ChartConfig::new("titer", ChartType::Box));

        let stats = &spec.series[0].boxes.as_ref().unwrap()[0];
        assert_eq!(stats.max, 9.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.n, 10);
        assert_eq!(spec.series[0].counts, Some(vec![10]));
        assert!(spec.warnings.is_empty());
    }

    #[test]
    fn test_boxes_per_category() {
        let mut rows = Vec::new();
        for v in ["1", "2", "3", "4", "5", "6"] {
            rows.push(Row::new().with("site", "north").with("titer", v));
        }
        for v in ["10", "20", "x"] {
            rows.push(Row::new().with("site", "south").with("titer", v));
        }
        rows.push(Row::new().with("site", "west").with("titer", ""));
        let profile = DatasetProfile::from_types([
            ("site", ColumnType::Categorical),
            ("titer", ColumnType::Numeric),
        ]);
        let chart = ChartConfig::new("site", ChartType::Box).with_y("titer");
        let spec = build(&rows, &profile, &chart);
        let series = &spec.series[0];

        assert_eq!(series.x, vec![Datum::Text("north".into()), Datum::Text("south".into())]);
        assert_eq!(series.y, vec![Datum::Number(3.5), Datum::Number(15.0)]);
        assert_eq!(series.counts, Some(vec![6, 2]));
        assert_eq!(series.boxes.as_ref().unwrap().len(), 2);
        assert!(spec.warnings.iter().any(|w| w.contains("Group 'west' has no usable 'titer'")));
        assert!(spec.warnings.iter().any(|w| w.contains("Group 'south' has only 2 values")));
        assert!(spec.warnings.iter().any(|w| w.contains("Group 'north' has 6 values")));
    }

    #[test]
    fn test_box_without_numeric_values() {
        let rows = vec![Row::new().with("titer", "n/a")];
        let profile = DatasetProfile::from_types([("titer", ColumnType::Numeric)]);
        let spec = build(&rows, &profile, &ChartConfig::new("titer", ChartType::Box));
        assert!(spec.series[0].is_empty());
        assert!(spec.warnings.iter().any(|w| w.contains("No numeric values")));
    }
}
