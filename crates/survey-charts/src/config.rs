//! Configuration types for the chart pipeline.
//!
//! Every tunable constant the core uses (inference thresholds, the plausible
//! year window, sample-size warning thresholds, jitter, and the range
//! vocabulary) lives here, with a builder for ergonomic setup.

use crate::coercion::RangeTable;
use crate::statistics::is_supported_confidence_level;
use serde::{Deserialize, Serialize};

/// Thresholds used by column type inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Fraction of sampled values that must parse for Date/Numeric (0.0 - 1.0).
    /// Default: 0.7
    pub parse_threshold: f64,
    /// Values drawn for date detection. Default: 100
    pub date_sample_cap: usize,
    /// Non-empty values of the date sample actually checked. Default: 30
    pub date_values_considered: usize,
    /// Values drawn for numeric/categorical detection. Default: 200
    pub numeric_sample_cap: usize,
    /// Inclusive range of distinct labels for a categorical column.
    /// Default: 2..=20
    pub min_categories: usize,
    pub max_categories: usize,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            parse_threshold: 0.7,
            date_sample_cap: 100,
            date_values_considered: 30,
            numeric_sample_cap: 200,
            min_categories: 2,
            max_categories: 20,
        }
    }
}

/// Minimum sample sizes per chart type. Below `*_min` the chart is flagged as
/// unreliable; below `*_warn` it gets a softer warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleSizeThresholds {
    pub histogram_min: usize,
    pub histogram_warn: usize,
    pub box_min: usize,
    pub box_warn: usize,
    pub scatter_min: usize,
    pub scatter_warn: usize,
    pub bar_warn: usize,
    pub periods_min: usize,
    pub periods_warn: usize,
}

impl Default for SampleSizeThresholds {
    fn default() -> Self {
        Self {
            histogram_min: 10,
            histogram_warn: 30,
            box_min: 5,
            box_warn: 10,
            scatter_min: 10,
            scatter_warn: 20,
            bar_warn: 3,
            periods_min: 3,
            periods_warn: 5,
        }
    }
}

/// Configuration for the chart pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration with a
/// fluent API, or deserialize a partial JSON settings file (missing fields
/// take their defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub inference: InferenceSettings,

    /// Earliest calendar year accepted as a study date. Default: 2015
    pub min_year: i32,

    /// Latest calendar year accepted as a study date. Default: 2100
    pub max_year: i32,

    /// Bin count used when a chart config does not set one. Default: 20
    pub default_bin_count: usize,

    /// Confidence level for mean intervals (0.90, 0.95 or 0.99). Default: 0.95
    pub confidence_level: f64,

    pub sample_size: SampleSizeThresholds,

    /// Seed for categorical scatter jitter. Default: 42
    pub jitter_seed: u64,

    /// Total jitter span around each encoded category position. Default: 0.3
    pub jitter_width: f64,

    /// Multiplier applied to the lower bound of open-ended buckets such as
    /// "8000 Euro und mehr". Default: 1.5
    pub open_ended_factor: f64,

    /// Explicit bucket-string to number table consulted by the coercer.
    pub range_table: RangeTable,

    /// Whether to parse unlisted bucket strings ("A bis unter B") by pattern.
    /// Default: true
    pub use_bucket_patterns: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference: InferenceSettings::default(),
            min_year: 2015,
            max_year: 2100,
            default_bin_count: 20,
            confidence_level: 0.95,
            sample_size: SampleSizeThresholds::default(),
            jitter_seed: 42,
            jitter_width: 0.3,
            open_ended_factor: 1.5,
            range_table: RangeTable::income_default(),
            use_bucket_patterns: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.inference.parse_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "inference.parse_threshold".to_string(),
                value: self.inference.parse_threshold,
            });
        }

        if self.inference.min_categories > self.inference.max_categories {
            return Err(ConfigValidationError::InvalidCategoryRange {
                min: self.inference.min_categories,
                max: self.inference.max_categories,
            });
        }

        if self.min_year > self.max_year {
            return Err(ConfigValidationError::InvalidYearWindow {
                min: self.min_year,
                max: self.max_year,
            });
        }

        if self.default_bin_count == 0 {
            return Err(ConfigValidationError::InvalidBinCount(self.default_bin_count));
        }

        if !is_supported_confidence_level(self.confidence_level) {
            return Err(ConfigValidationError::UnsupportedConfidenceLevel(
                self.confidence_level,
            ));
        }

        if !self.jitter_width.is_finite() || !(0.0..1.0).contains(&self.jitter_width) {
            return Err(ConfigValidationError::InvalidJitterWidth(self.jitter_width));
        }

        if !self.open_ended_factor.is_finite() || self.open_ended_factor < 1.0 {
            return Err(ConfigValidationError::InvalidOpenEndedFactor(
                self.open_ended_factor,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid category range {min}..={max}")]
    InvalidCategoryRange { min: usize, max: usize },

    #[error("Invalid year window {min}..={max}")]
    InvalidYearWindow { min: i32, max: i32 },

    #[error("Invalid default bin count: {0} (must be at least 1)")]
    InvalidBinCount(usize),

    #[error("Unsupported confidence level: {0} (supported: 0.90, 0.95, 0.99)")]
    UnsupportedConfidenceLevel(f64),

    #[error("Invalid jitter width: {0} (must be in [0.0, 1.0))")]
    InvalidJitterWidth(f64),

    #[error("Invalid open-ended bucket factor: {0} (must be at least 1.0)")]
    InvalidOpenEndedFactor(f64),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    inference: Option<InferenceSettings>,
    min_year: Option<i32>,
    max_year: Option<i32>,
    default_bin_count: Option<usize>,
    confidence_level: Option<f64>,
    sample_size: Option<SampleSizeThresholds>,
    jitter_seed: Option<u64>,
    jitter_width: Option<f64>,
    open_ended_factor: Option<f64>,
    range_table: Option<RangeTable>,
    use_bucket_patterns: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Replace the type inference thresholds.
    pub fn inference(mut self, settings: InferenceSettings) -> Self {
        self.inference = Some(settings);
        self
    }

    /// Set the inclusive window of plausible calendar years.
    pub fn year_window(mut self, min_year: i32, max_year: i32) -> Self {
        self.min_year = Some(min_year);
        self.max_year = Some(max_year);
        self
    }

    /// Set the bin count used when a chart does not specify one.
    pub fn default_bin_count(mut self, bins: usize) -> Self {
        self.default_bin_count = Some(bins);
        self
    }

    /// Set the confidence level for mean intervals.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = Some(level);
        self
    }

    /// Replace the per-chart sample-size thresholds.
    pub fn sample_size(mut self, thresholds: SampleSizeThresholds) -> Self {
        self.sample_size = Some(thresholds);
        self
    }

    /// Set the seed and total width of categorical scatter jitter.
    pub fn jitter(mut self, seed: u64, width: f64) -> Self {
        self.jitter_seed = Some(seed);
        self.jitter_width = Some(width);
        self
    }

    /// Set the multiplier for open-ended top buckets.
    pub fn open_ended_factor(mut self, factor: f64) -> Self {
        self.open_ended_factor = Some(factor);
        self
    }

    /// Inject a bucket vocabulary for the numeric coercer.
    pub fn range_table(mut self, table: RangeTable) -> Self {
        self.range_table = Some(table);
        self
    }

    /// Enable or disable pattern-based bucket parsing.
    pub fn use_bucket_patterns(mut self, enable: bool) -> Self {
        self.use_bucket_patterns = Some(enable);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            inference: self.inference.unwrap_or(defaults.inference),
            min_year: self.min_year.unwrap_or(defaults.min_year),
            max_year: self.max_year.unwrap_or(defaults.max_year),
            default_bin_count: self.default_bin_count.unwrap_or(defaults.default_bin_count),
            confidence_level: self.confidence_level.unwrap_or(defaults.confidence_level),
            sample_size: self.sample_size.unwrap_or(defaults.sample_size),
            jitter_seed: self.jitter_seed.unwrap_or(defaults.jitter_seed),
            jitter_width: self.jitter_width.unwrap_or(defaults.jitter_width),
            open_ended_factor: self.open_ended_factor.unwrap_or(defaults.open_ended_factor),
            range_table: self.range_table.unwrap_or(defaults.range_table),
            use_bucket_patterns: self
                .use_bucket_patterns
                .unwrap_or(defaults.use_bucket_patterns),
        };

        config.validate()?;
        Ok(config)
    }
}
