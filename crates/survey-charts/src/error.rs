//! Error types for the chart pipeline.
//!
//! Only programmer-error-class violations (unknown constants, invalid bin
//! counts, malformed filter selections) are errors. Data-quality problems are
//! reported as warnings on the chart specification, and incompatible chart
//! selections are returned as a structured rejection rather than an error.
//!
//! Errors are serializable so they can be sent to the dashboard frontend for
//! display.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the chart pipeline.
#[derive(Error, Debug)]
pub enum ChartError {
    /// A chart type constant that is not recognised.
    #[error("Unknown chart type '{0}'")]
    UnknownChartType(String),

    /// An aggregation constant that is not recognised.
    #[error("Unknown aggregation '{0}'")]
    UnknownAggregation(String),

    /// A date period constant that is not recognised.
    #[error("Unknown date period '{0}'")]
    UnknownPeriod(String),

    /// Bin count must be at least 1.
    #[error("Invalid bin count {0} (must be at least 1)")]
    InvalidBinCount(usize),

    /// Confidence level outside the tabulated set.
    #[error("Unsupported confidence level {0} (supported: 0.90, 0.95, 0.99)")]
    UnsupportedConfidenceLevel(f64),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A filter selection that does not fit the column's filter kind.
    #[error("Invalid filter for column '{column}': {reason}")]
    InvalidFilter { column: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper (CSV ingestion).
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ChartError>,
    },
}

impl ChartError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ChartError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownChartType(_) => "UNKNOWN_CHART_TYPE",
            Self::UnknownAggregation(_) => "UNKNOWN_AGGREGATION",
            Self::UnknownPeriod(_) => "UNKNOWN_PERIOD",
            Self::InvalidBinCount(_) => "INVALID_BIN_COUNT",
            Self::UnsupportedConfidenceLevel(_) => "UNSUPPORTED_CONFIDENCE_LEVEL",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidFilter { .. } => "INVALID_FILTER",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the caller's configuration rather
    /// than by ingestion or serialization.
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::UnknownChartType(_)
            | Self::UnknownAggregation(_)
            | Self::UnknownPeriod(_)
            | Self::InvalidBinCount(_)
            | Self::UnsupportedConfidenceLevel(_)
            | Self::InvalidConfig(_)
            | Self::InvalidFilter { .. } => true,
            Self::WithContext { source, .. } => source.is_config_error(),
            Self::Io(_) | Self::Polars(_) | Self::Json(_) => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ChartError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ChartError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for chart pipeline operations.
pub type Result<T> = std::result::Result<T, ChartError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ChartError::Polars(e).with_context(context))
    }
}
