//! Histogram: equal-width bins of a numeric X, counted.

use super::{ChartContext, ChartStrategy};
use crate::aggregation::{GroupKey, aggregate};
use crate::binning::bin_numeric;
use crate::error::Result;
use crate::types::{Aggregation, AxisSpec, ChartSpec, ChartType, Datum, SeriesKind, SeriesSpec};
use crate::validation::check_sample_size;

#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramChart;

impl ChartStrategy for HistogramChart {
    fn chart_type(&self) -> ChartType {
        ChartType::Histogram
    }

    fn build(&self, ctx: &ChartContext<'_>) -> Result<ChartSpec> {
        let x = ctx.x_field();
        let coercion = ctx.coerce_column(x);
        let layout = bin_numeric(&coercion.values, ctx.bin_count())?;

        let mut warnings: Vec<String> = coercion.diagnostic(x).into_iter().collect();
        if layout.is_empty() {
            warnings.push(format!("No numeric values in '{x}' to bin"));
        }

        let result = aggregate(
            ctx.rows,
            |row| {
                ctx.coercer
                    .coerce_value(row.get(x))
                    .value()
                    .and_then(|v| layout.bin_of(v))
                    .map(GroupKey::Bin)
            },
            None,
            Aggregation::Count,
            ctx.coercer,
        )?;

        // Every bin is emitted, empty ones with a zero count
        let mut counts = vec![0usize; layout.len()];
        for group in &result.groups {
            if let GroupKey::Bin(bin) = &group.key {
                counts[bin.index] = group.n;
            }
        }

        let mut series = SeriesSpec::new(SeriesKind::Bar, "Count");
        series.x = layout.bins.iter().map(|&c| Datum::Number(c)).collect();
        series.y = counts.iter().map(|&n| Datum::Number(n as f64)).collect();
        series.counts = Some(counts);

        let total = coercion.values.len();
        warnings.extend(check_sample_size(
            ChartType::Histogram,
            &[(x.to_string(), total)],
            &ctx.config.sample_size,
        ));

        Ok(ChartSpec {
            chart_type: ChartType::Histogram,
            series: vec![series],
            x_axis: AxisSpec::titled(x),
            y_axis: AxisSpec::titled("Count"),
            warnings,
        })
    }
}
