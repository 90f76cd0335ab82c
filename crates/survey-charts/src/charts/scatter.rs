//! Scatter plot: raw (x, y) pairs, no aggregation.
//!
//! Categorical axes are either drawn as labels or, with
//! `encode_categorical`, mapped to integer positions in lexicographic label
//! order plus seeded jitter so overlapping points separate and repeated draws
//! are identical.

use super::{ChartContext, ChartStrategy};
use crate::coercion::CoercedValue;
use crate::error::Result;
use crate::types::{
    AxisSpec, CellValue, ChartSpec, ChartType, ColumnType, Datum, SeriesKind, SeriesSpec,
    TickEntry,
};
use crate::validation::check_sample_size;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const DATE_POINT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct ScatterChart;

/// How one axis turns a cell into a coordinate.
enum AxisEncoding {
    Numeric,
    Date,
    Label,
    Positions(BTreeMap<String, f64>),
}

impl AxisEncoding {
    fn for_column(ctx: &ChartContext<'_>, column: &str, column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Numeric => AxisEncoding::Numeric,
            ColumnType::Date => AxisEncoding::Date,
            ColumnType::Categorical | ColumnType::Other if ctx.chart.encode_categorical => {
                let labels: BTreeSet<String> = ctx
                    .rows
                    .iter()
                    .filter_map(|row| row.get(column).label())
                    .collect();
                let positions = labels
                    .into_iter()
                    .enumerate()
                    .map(|(i, label)| (label, i as f64))
                    .collect();
                AxisEncoding::Positions(positions)
            }
            ColumnType::Categorical | ColumnType::Other => AxisEncoding::Label,
        }
    }

    /// Coordinate for `cell`, before jitter. `None` when the cell has no
    /// usable value on this axis.
    fn encode(&self, ctx: &ChartContext<'_>, cell: &CellValue) -> Option<Datum> {
        match self {
            AxisEncoding::Numeric => match ctx.coercer.coerce_value(cell) {
                CoercedValue::Value(v) => Some(Datum::Number(v)),
                _ => None,
            },
            AxisEncoding::Date => ctx
                .dates
                .parse_valid_date(cell)
                .map(|instant| Datum::Text(instant.format(DATE_POINT_FORMAT).to_string())),
            AxisEncoding::Label => cell.label().map(Datum::Text),
            AxisEncoding::Positions(positions) => cell
                .label()
                .and_then(|label| positions.get(&label).copied())
                .map(Datum::Number),
        }
    }

    fn is_encoded(&self) -> bool {
        matches!(self, AxisEncoding::Positions(_))
    }

    fn axis(&self, title: &str) -> AxisSpec {
        match self {
            AxisEncoding::Positions(positions) => {
                let mut ticks: Vec<TickEntry> = positions
                    .iter()
                    .map(|(label, &value)| TickEntry {
                        value,
                        label: label.clone(),
                    })
                    .collect();
                ticks.sort_by(|a, b| a.value.total_cmp(&b.value));
                AxisSpec::titled(title).with_ticks(ticks)
            }
            _ => AxisSpec::titled(title),
        }
    }
}

fn jitter(rng: &mut StdRng, width: f64, datum: Datum) -> Datum {
    match datum {
        Datum::Number(v) if width > 0.0 => {
            let half = width / 2.0;
            Datum::Number(v + rng.gen_range(-half..=half))
        }
        other => other,
    }
}

impl ChartStrategy for ScatterChart {
    fn chart_type(&self) -> ChartType {
        ChartType::Scatter
    }

    fn build(&self, ctx: &ChartContext<'_>) -> Result<ChartSpec> {
        let x = ctx.x_field();
        // Validation only admits scatter with a Y column
        let y = ctx.y_field().unwrap_or(x);
        let y_type = ctx.y_type.unwrap_or(ctx.x_type);

        let x_encoding = AxisEncoding::for_column(ctx, x, ctx.x_type);
        let y_encoding = AxisEncoding::for_column(ctx, y, y_type);

        let mut rng = StdRng::seed_from_u64(ctx.config.jitter_seed);
        let width = ctx.config.jitter_width;

        let mut series = SeriesSpec::new(SeriesKind::Scatter, format!("{y} vs {x}"));
        let mut dropped = 0usize;

        for row in ctx.rows {
            let point = (
                x_encoding.encode(ctx, row.get(x)),
                y_encoding.encode(ctx, row.get(y)),
            );
            let (Some(px), Some(py)) = point else {
                dropped += 1;
                continue;
            };

            let px = if x_encoding.is_encoded() {
                jitter(&mut rng, width, px)
            } else {
                px
            };
            let py = if y_encoding.is_encoded() {
                jitter(&mut rng, width, py)
            } else {
                py
            };
            series.x.push(px);
            series.y.push(py);
        }

        debug!(points = series.len(), dropped, "Scatter points collected");

        let mut warnings = Vec::new();
        if dropped > 0 {
            warnings.push(format!(
                "Dropped {dropped} of {} rows with a missing or unusable '{x}' or '{y}' value",
                ctx.rows.len()
            ));
        }
        warnings.extend(check_sample_size(
            ChartType::Scatter,
            &[(format!("{y} vs {x}"), series.len())],
            &ctx.config.sample_size,
        ));

        Ok(ChartSpec {
            chart_type: ChartType::Scatter,
            x_axis: x_encoding.axis(x),
            y_axis: y_encoding.axis(y),
            series: vec![series],
            warnings,
        })
    }
}
