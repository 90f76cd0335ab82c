//! Survey Chart Pipeline Library
//!
//! Turns a chart configuration (X/Y variables, chart type, aggregation, date
//! period) and a filtered set of survey rows into a renderable chart
//! specification: series plus axis metadata plus non-fatal warnings.
//!
//! # Overview
//!
//! - **Profiling**: per-column type inference (numeric, categorical, date,
//!   other) from a bounded sample, cached in a [`DatasetProfile`]
//! - **Coercion**: numeric parsing with range-bucket lookups such as
//!   "1000 bis unter 2000 Euro", with exclusion diagnostics
//! - **Dates**: heterogeneous date parsing, plausible-year window, and
//!   day/week/month/quarter/year bucketing
//! - **Aggregation**: count/sum/mean/median per category, bin, or period
//! - **Statistics**: nearest-rank box summaries and t-based mean intervals
//! - **Validation**: chart type compatibility and sample-size warnings
//! - **Chart specs**: one [`ChartStrategy`] per chart type, composed by
//!   [`ChartSpecBuilder`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use survey_charts::{
//!     Aggregation, ChartConfig, ChartOutcome, ChartSpecBuilder, ChartType, Dataset, FilterSet,
//!     PipelineConfig,
//! };
//!
//! let dataset = Dataset::read_csv("survey.csv")?;
//! let config = PipelineConfig::builder().confidence_level(0.95).build()?;
//! let builder = ChartSpecBuilder::new(config);
//!
//! let chart = ChartConfig::new("age_group", ChartType::Bar)
//!     .with_y("income")
//!     .with_aggregation(Aggregation::Mean)
//!     .with_confidence(true);
//!
//! match builder.build_for(&dataset, &FilterSet::default(), &chart)? {
//!     ChartOutcome::Rendered(spec) => println!("{}", serde_json::to_string_pretty(&spec)?),
//!     ChartOutcome::Rejected(rejection) => eprintln!("{}", rejection.reason),
//! }
//! ```
//!
//! # Filters
//!
//! Raw UI selections are resolved once per column into a typed
//! [`FilterCondition`]:
//!
//! ```rust,ignore
//! use serde_json::json;
//!
//! let profile = builder.profile(&dataset);
//! let filters = FilterSet::new(builder.config())
//!     .with(Filter::resolve("age", ColumnType::Numeric, &json!({"min": 18, "max": 65}))?.unwrap())
//!     .with(Filter::resolve("vaccinated", ColumnType::Categorical, &json!(true))?.unwrap());
//! ```

pub mod aggregation;
pub mod binning;
pub mod charts;
pub mod coercion;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod profiler;
pub mod statistics;
pub mod temporal;
pub mod types;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use aggregation::{AggregateGroup, AggregationResult, GroupKey, aggregate};
pub use binning::{Bin, BinLayout, bin_numeric, compute_nice_step};
pub use charts::{
    BarChart, BoxChart, ChartContext, ChartSpecBuilder, ChartStrategy, HistogramChart, LineChart,
    ScatterChart,
};
pub use coercion::{
    BucketPatternLookup, CoercedValue, Coercion, NumericCoercer, RangeLookup, RangeTable,
    coerce_numeric,
};
pub use config::{
    ConfigValidationError, InferenceSettings, PipelineConfig, PipelineConfigBuilder,
    SampleSizeThresholds,
};
pub use dataset::{Dataset, Row};
pub use error::{ChartError, Result as ChartResult, ResultExt};
pub use filters::{Filter, FilterCondition, FilterSet};
pub use profiler::{
    ColumnProfile, ColumnSection, DatasetProfile, SectionRules, TypeClassifier, classify,
    profile_dataset,
};
pub use statistics::{BoxStats, ConfidenceInterval, box_stats, mean_confidence_interval};
pub use temporal::{DateNormalizer, parse_valid_date, period_key_of, sort_period_keys};
pub use types::{
    Aggregation, AxisSpec, CellValue, ChartConfig, ChartOutcome, ChartSpec, ChartType, ColumnType,
    Datum, Incompatibility, Period, SeriesKind, SeriesSpec, TickEntry,
};
pub use validation::{check_compatibility, check_sample_size, valid_types};
