//! Chart specification builder.
//!
//! Each chart type is a [`ChartStrategy`] registered in a
//! [`ChartSpecBuilder`]. A build call validates the X/Y type pair first and
//! returns an explicit [`ChartOutcome::Rejected`] for invalid selections;
//! only valid selections reach a strategy.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_charts::{ChartConfig, ChartSpecBuilder, ChartType, Aggregation, FilterSet};
//!
//! let builder = ChartSpecBuilder::new(PipelineConfig::default());
//! let chart = ChartConfig::new("age_group", ChartType::Bar)
//!     .with_y("income")
//!     .with_aggregation(Aggregation::Mean);
//! let outcome = builder.build_for(&dataset, &FilterSet::default(), &chart)?;
//! ```

pub mod bar;
pub mod box_plot;
pub mod histogram;
pub mod line;
pub mod scatter;

pub use bar::BarChart;
pub use box_plot::BoxChart;
pub use histogram::HistogramChart;
pub use line::LineChart;
pub use scatter::ScatterChart;

use crate::aggregation::{AggregationResult, GroupKey, aggregate};
use crate::binning::{BinLayout, bin_numeric};
use crate::coercion::{Coercion, NumericCoercer};
use crate::config::PipelineConfig;
use crate::dataset::{Dataset, Row};
use crate::error::{ChartError, Result, ResultExt};
use crate::filters::FilterSet;
use crate::profiler::{DatasetProfile, profile_dataset};
use crate::statistics::mean_confidence_interval;
use crate::temporal::{DateNormalizer, period_key_of};
use crate::types::{
    Aggregation, AxisSpec, ChartConfig, ChartOutcome, ChartSpec, ChartType, ColumnType, Datum,
    Period, SeriesKind, SeriesSpec,
};
use crate::validation::{check_compatibility, check_sample_size};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds the spec for one chart type.
pub trait ChartStrategy: Send + Sync {
    fn chart_type(&self) -> ChartType;

    /// Build from a context whose X/Y types are already validated for
    /// [`ChartStrategy::chart_type`].
    fn build(&self, ctx: &ChartContext<'_>) -> Result<ChartSpec>;
}

/// How rows are keyed along the X axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Grouping {
    Categories,
    Bins(BinLayout),
    Periods(Period),
}

/// Everything a strategy needs for one redraw.
pub struct ChartContext<'a> {
    pub rows: &'a [&'a Row],
    pub chart: &'a ChartConfig,
    pub x_type: ColumnType,
    pub y_type: Option<ColumnType>,
    pub config: &'a PipelineConfig,
    pub coercer: &'a NumericCoercer,
    pub dates: &'a DateNormalizer,
}

impl<'a> ChartContext<'a> {
    pub fn x_field(&self) -> &str {
        &self.chart.x_field
    }

    pub fn y_field(&self) -> Option<&str> {
        self.chart.y_field.as_deref()
    }

    pub fn bin_count(&self) -> usize {
        self.chart.x_bin_count.unwrap_or(self.config.default_bin_count)
    }

    /// Coerce `column` over all rows.
    pub fn coerce_column(&self, column: &str) -> Coercion {
        self.coercer
            .coerce_numeric(self.rows.iter().map(|row| row.get(column)))
    }

    /// Grouping for the X column: bins for numeric, periods for dates,
    /// labels otherwise.
    pub fn grouping(&self) -> Result<Grouping> {
        match self.x_type {
            ColumnType::Numeric => {
                let values = self.coerce_column(self.x_field()).values;
                let layout = bin_numeric(&values, self.bin_count())
                    .context(format!("Binning '{}'", self.x_field()))?;
                Ok(Grouping::Bins(layout))
            }
            ColumnType::Date => Ok(Grouping::Periods(self.chart.x_period)),
            ColumnType::Categorical | ColumnType::Other => Ok(Grouping::Categories),
        }
    }

    pub fn group_key(&self, grouping: &Grouping, row: &Row) -> Option<GroupKey> {
        let cell = row.get(self.x_field());
        match grouping {
            Grouping::Categories => cell.label().map(GroupKey::Category),
            Grouping::Bins(layout) => self
                .coercer
                .coerce_value(cell)
                .value()
                .and_then(|v| layout.bin_of(v))
                .map(GroupKey::Bin),
            Grouping::Periods(period) => self.dates.parse_valid_date(cell).map(|instant| {
                GroupKey::Period {
                    key: period_key_of(&instant, *period),
                    period: *period,
                }
            }),
        }
    }

    /// Group rows along X and reduce the Y column with `kind`.
    pub fn aggregate_by_x(&self, kind: Aggregation) -> Result<(Grouping, AggregationResult)> {
        let grouping = self.grouping()?;
        let value_column = if kind == Aggregation::Count {
            None
        } else {
            self.y_field()
        };
        let result = aggregate(
            self.rows,
            |row| self.group_key(&grouping, row),
            value_column,
            kind,
            self.coercer,
        )?;
        Ok((grouping, result))
    }

    /// Aggregation actually applied: `count` when there is no Y column.
    pub fn effective_aggregation(&self) -> Aggregation {
        match self.y_field() {
            Some(_) => self.chart.aggregation,
            None => Aggregation::Count,
        }
    }

    pub fn x_axis(&self) -> AxisSpec {
        match self.x_type {
            ColumnType::Date => {
                AxisSpec::titled(format!("{} ({})", self.x_field(), self.chart.x_period))
            }
            _ => AxisSpec::titled(self.x_field()),
        }
    }

    pub fn value_axis(&self, kind: Aggregation) -> AxisSpec {
        AxisSpec::titled(value_label(kind, self.y_field()))
    }

    /// Warnings about rows and values the aggregation could not use.
    pub fn aggregation_warnings(
        &self,
        kind: Aggregation,
        result: &AggregationResult,
    ) -> Vec<String> {
        let mut warnings = Vec::new();

        if result.unkeyed > 0 {
            warnings.push(format!(
                "{} rows without a usable '{}' value were excluded",
                result.unkeyed,
                self.x_field()
            ));
        }

        if kind != Aggregation::Count
            && let Some(y) = self.y_field()
        {
            if let Some(diagnostic) = self.coerce_column(y).diagnostic(y) {
                warnings.push(diagnostic);
            }
            for group in result.insufficient() {
                warnings.push(format!(
                    "Group '{}' has no usable '{}' values; its {} is not shown",
                    group.key.label(),
                    y,
                    kind
                ));
            }
        }

        warnings
    }
}

/// "Count", "Mean of income", ...
pub fn value_label(kind: Aggregation, column: Option<&str>) -> String {
    match (kind, column) {
        (Aggregation::Count, _) | (_, None) => "Count".to_string(),
        (kind, Some(column)) => {
            let name = kind.as_str();
            let mut chars = name.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            };
            format!("{capitalized} of {column}")
        }
    }
}

/// Shared bar/line pipeline: group along X, reduce Y, attach counts and
/// optional confidence bounds.
pub(crate) fn grouped_spec(
    ctx: &ChartContext<'_>,
    chart_type: ChartType,
    kind: SeriesKind,
) -> Result<ChartSpec> {
    let aggregation = ctx.effective_aggregation();
    let (_, result) = ctx.aggregate_by_x(aggregation)?;
    let mut warnings = ctx.aggregation_warnings(aggregation, &result);

    let mut series = SeriesSpec::new(kind, value_label(aggregation, ctx.y_field()));
    series.x = result.groups.iter().map(|g| g.key.datum()).collect();
    series.y = result.groups.iter().map(|g| Datum::from(g.value)).collect();
    series.counts = Some(result.groups.iter().map(|g| g.n).collect());

    if ctx.chart.show_confidence {
        if aggregation == Aggregation::Mean {
            let mut bounds = Vec::with_capacity(result.groups.len());
            for group in &result.groups {
                let interval =
                    mean_confidence_interval(&group.values, ctx.config.confidence_level)?;
                if !interval.computable && !group.insufficient_data {
                    warnings.push(format!(
                        "Group '{}' has {} value(s); no confidence interval",
                        group.key.label(),
                        interval.n
                    ));
                }
                bounds.push(interval.bounds());
            }
            series.confidence = Some(bounds);
        } else {
            warnings.push(format!(
                "Confidence intervals are only available for mean aggregation, not {aggregation}"
            ));
        }
    }

    let sizes: Vec<(String, usize)> = result
        .groups
        .iter()
        .map(|g| (g.key.label(), g.n))
        .collect();
    warnings.extend(check_sample_size(chart_type, &sizes, &ctx.config.sample_size));

    Ok(ChartSpec {
        chart_type,
        series: vec![series],
        x_axis: ctx.x_axis(),
        y_axis: ctx.value_axis(aggregation),
        warnings,
    })
}

/// Composes chart strategies and runs validation before each build.
pub struct ChartSpecBuilder {
    config: PipelineConfig,
    coercer: NumericCoercer,
    dates: DateNormalizer,
    strategies: HashMap<ChartType, Arc<dyn ChartStrategy>>,
}

static_assertions::assert_impl_all!(ChartSpecBuilder: Send, Sync);

impl Default for ChartSpecBuilder {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl ChartSpecBuilder {
    /// Builder with the five standard strategies registered.
    pub fn new(config: PipelineConfig) -> Self {
        Self::without_strategies(config)
            .with_strategy(Arc::new(HistogramChart))
            .with_strategy(Arc::new(BarChart))
            .with_strategy(Arc::new(LineChart))
            .with_strategy(Arc::new(ScatterChart))
            .with_strategy(Arc::new(BoxChart))
    }

    pub fn without_strategies(config: PipelineConfig) -> Self {
        Self {
            coercer: NumericCoercer::from_config(&config),
            dates: DateNormalizer::from_config(&config),
            config,
            strategies: HashMap::new(),
        }
    }

    /// Register a strategy, replacing any existing one for its chart type.
    pub fn with_strategy(mut self, strategy: Arc<dyn ChartStrategy>) -> Self {
        self.strategies.insert(strategy.chart_type(), strategy);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn profile(&self, dataset: &Dataset) -> DatasetProfile {
        profile_dataset(dataset, &self.config)
    }

    /// Build one chart from already-filtered rows.
    pub fn build(
        &self,
        rows: &[&Row],
        profile: &DatasetProfile,
        chart: &ChartConfig,
    ) -> Result<ChartOutcome> {
        if chart.x_bin_count == Some(0) {
            return Err(ChartError::InvalidBinCount(0));
        }

        let x_type = profile.column_type(&chart.x_field);
        let y_type = chart.y_field.as_deref().map(|y| profile.column_type(y));

        if let Err(rejection) = check_compatibility(chart.chart_type, x_type, y_type) {
            warn!(chart_type = %chart.chart_type, "Rejected chart: {}", rejection.reason);
            return Ok(ChartOutcome::Rejected(rejection));
        }

        let strategy = self.strategies.get(&chart.chart_type).ok_or_else(|| {
            ChartError::InvalidConfig(format!(
                "no strategy registered for chart type '{}'",
                chart.chart_type
            ))
        })?;

        debug!(
            chart_type = %chart.chart_type,
            x = %chart.x_field,
            %x_type,
            rows = rows.len(),
            "Building chart"
        );

        let ctx = ChartContext {
            rows,
            chart,
            x_type,
            y_type,
            config: &self.config,
            coercer: &self.coercer,
            dates: &self.dates,
        };
        let spec = strategy
            .build(&ctx)
            .context(format!("Building {} chart", chart.chart_type))?;

        info!(
            chart_type = %spec.chart_type,
            series = spec.series.len(),
            warnings = spec.warnings.len(),
            "Chart built"
        );
        Ok(ChartOutcome::Rendered(spec))
    }

    /// Profile `dataset`, apply `filters`, and build. Column types come from
    /// the unfiltered data so a narrow filter cannot flip a column's type.
    pub fn build_for(
        &self,
        dataset: &Dataset,
        filters: &FilterSet,
        chart: &ChartConfig,
    ) -> Result<ChartOutcome> {
        let profile = self.profile(dataset);
        let rows = filters.apply(dataset.rows());
        self.build(&rows, &profile, chart)
    }
}
