use crate::error::ChartError;
use crate::statistics::BoxStats;
use crate::utils::format_number;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Cell values
// ============================================================================

/// A raw cell value as produced by CSV ingestion or the UI data layer.
///
/// Values are untyped: a numeric column may hold `Text("12")`, `Number(12.0)`,
/// or bucket strings such as `"1000 bis unter 2000 Euro"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Null, or text that is empty after trimming.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Bool(_) | CellValue::Number(_) => false,
        }
    }

    /// Display label used for categorical grouping. `None` for missing values.
    pub fn label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(v) => Some(format_number(*v)),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Semantic type of a column, inferred from a sample of its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Date,
    Other,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Date => "date",
            ColumnType::Other => "other",
        };
        f.write_str(name)
    }
}

/// Chart types the dashboard can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Histogram,
    Bar,
    Line,
    Scatter,
    Box,
}

impl ChartType {
    pub const ALL: [ChartType; 5] = [
        ChartType::Histogram,
        ChartType::Bar,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Box,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Histogram => "histogram",
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Box => "box",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "histogram" => Ok(ChartType::Histogram),
            "bar" => Ok(ChartType::Bar),
            "line" | "timeseries" | "time_series" => Ok(ChartType::Line),
            "scatter" => Ok(ChartType::Scatter),
            "box" | "boxplot" => Ok(ChartType::Box),
            other => Err(ChartError::UnknownChartType(other.to_string())),
        }
    }
}

/// Reduction applied to each group's value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Count,
    Sum,
    Mean,
    Median,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Median => "median",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(Aggregation::Count),
            "sum" => Ok(Aggregation::Sum),
            "mean" | "avg" | "average" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            other => Err(ChartError::UnknownAggregation(other.to_string())),
        }
    }
}

/// Calendar period used to bucket date values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(ChartError::UnknownPeriod(other.to_string())),
        }
    }
}

// ============================================================================
// Chart configuration (UI form state)
// ============================================================================

/// User-selected chart configuration, consumed once per redraw.
///
/// Deserializes from the camelCase JSON the dashboard mirrors to local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub x_field: String,
    #[serde(default)]
    pub y_field: Option<String>,
    pub chart_type: ChartType,
    #[serde(default)]
    pub aggregation: Aggregation,
    /// Bin count for numeric X. Falls back to the pipeline default.
    #[serde(default)]
    pub x_bin_count: Option<usize>,
    #[serde(default)]
    pub x_period: Period,
    #[serde(default)]
    pub encode_categorical: bool,
    /// Attach mean confidence bounds to bar/line charts.
    #[serde(default)]
    pub show_confidence: bool,
}

impl ChartConfig {
    pub fn new(x_field: impl Into<String>, chart_type: ChartType) -> Self {
        Self {
            x_field: x_field.into(),
            y_field: None,
            chart_type,
            aggregation: Aggregation::default(),
            x_bin_count: None,
            x_period: Period::default(),
            encode_categorical: false,
            show_confidence: false,
        }
    }

    pub fn with_y(mut self, y_field: impl Into<String>) -> Self {
        self.y_field = Some(y_field.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.x_bin_count = Some(bins);
        self
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.x_period = period;
        self
    }

    pub fn with_encoded_categories(mut self, encode: bool) -> Self {
        self.encode_categorical = encode;
        self
    }

    pub fn with_confidence(mut self, show: bool) -> Self {
        self.show_confidence = show;
        self
    }
}

// ============================================================================
// Chart specification (renderer contract)
// ============================================================================

/// A single point coordinate handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Number(f64),
    Text(String),
    Null,
}

impl Datum {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Option<f64>> for Datum {
    fn from(value: Option<f64>) -> Self {
        value.map(Datum::Number).unwrap_or(Datum::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Bar,
    Line,
    Scatter,
    Box,
}

/// One renderable trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub kind: SeriesKind,
    pub label: String,
    pub x: Vec<Datum>,
    pub y: Vec<Datum>,
    /// Per-point sample size, for hover text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<usize>>,
    /// Per-point `[lower, upper]` confidence bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Vec<Option<[f64; 2]>>>,
    /// Precomputed box statistics, one per `x` entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boxes: Option<Vec<BoxStats>>,
}

impl SeriesSpec {
    pub fn new(kind: SeriesKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            x: Vec::new(),
            y: Vec::new(),
            counts: None,
            confidence: None,
            boxes: None,
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Axis metadata. `tickvals`/`ticktext` are set for encoded categorical axes
/// and labelled bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AxisSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
}

impl AxisSpec {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tickvals: None,
            ticktext: None,
        }
    }

    pub fn with_ticks(mut self, ticks: Vec<TickEntry>) -> Self {
        let (vals, text): (Vec<f64>, Vec<String>) =
            ticks.into_iter().map(|t| (t.value, t.label)).unzip();
        self.tickvals = Some(vals);
        self.ticktext = Some(text);
        self
    }
}

/// Maps an encoded axis position back to its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEntry {
    pub value: f64,
    pub label: String,
}

/// The finished chart: series plus axis metadata and non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub series: Vec<SeriesSpec>,
    pub x_axis: AxisSpec,
    pub y_axis: AxisSpec,
    pub warnings: Vec<String>,
}

/// Why a chart selection was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incompatibility {
    pub chart_type: ChartType,
    pub x_type: ColumnType,
    pub y_type: Option<ColumnType>,
    pub valid_types: Vec<ChartType>,
    pub reason: String,
}

/// Result of one redraw: either a renderable spec or an explicit refusal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChartOutcome {
    Rendered(ChartSpec),
    Rejected(Incompatibility),
}

impl ChartOutcome {
    pub fn spec(&self) -> Option<&ChartSpec> {
        match self {
            ChartOutcome::Rendered(spec) => Some(spec),
            ChartOutcome::Rejected(_) => None,
        }
    }

    pub fn into_spec(self) -> Option<ChartSpec> {
        match self {
            ChartOutcome::Rendered(spec) => Some(spec),
            ChartOutcome::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ChartOutcome::Rejected(_))
    }
}
