//! Numeric coercion of untyped survey cells.
//!
//! A cell becomes a finite `f64` when it is a number, a numeric string, or a
//! bucket label covered by one of the configured [`RangeLookup`]s. Everything
//! else is excluded and counted by reason, so charts can surface how much data
//! was dropped.

mod range_lookup;

pub use range_lookup::{BucketPatternLookup, RangeLookup, RangeTable, normalize_label};

use crate::config::PipelineConfig;
use crate::types::CellValue;
use crate::utils::{is_error_marker, parse_numeric_string};
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;

/// Outcome of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoercedValue {
    Value(f64),
    /// Null, blank, or a missing-value marker ("k.A.", "N/A", ...).
    Missing,
    /// Present but not interpretable as a number.
    NonNumeric,
    /// Parsed to infinity or NaN.
    NonFinite,
}

impl CoercedValue {
    pub fn value(self) -> Option<f64> {
        match self {
            CoercedValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Coerced values of a column plus exclusion counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Coercion {
    pub values: Vec<f64>,
    pub excluded: usize,
    pub missing: usize,
    pub non_numeric: usize,
    pub non_finite: usize,
}

impl Coercion {
    fn record(&mut self, outcome: CoercedValue) {
        match outcome {
            CoercedValue::Value(v) => {
                self.values.push(v);
                return;
            }
            CoercedValue::Missing => self.missing += 1,
            CoercedValue::NonNumeric => self.non_numeric += 1,
            CoercedValue::NonFinite => self.non_finite += 1,
        }
        self.excluded += 1;
    }

    pub fn total(&self) -> usize {
        self.values.len() + self.excluded
    }

    /// Human-readable note about excluded values, `None` when nothing was
    /// dropped.
    pub fn diagnostic(&self, column: &str) -> Option<String> {
        if self.excluded == 0 {
            return None;
        }

        let mut reasons = Vec::new();
        if self.missing > 0 {
            reasons.push(format!("{} missing", self.missing));
        }
        if self.non_numeric > 0 {
            reasons.push(format!("{} non-numeric", self.non_numeric));
        }
        if self.non_finite > 0 {
            reasons.push(format!("{} non-finite", self.non_finite));
        }

        Some(format!(
            "Excluded {} of {} values in '{}' ({})",
            self.excluded,
            self.total(),
            column,
            reasons.join(", ")
        ))
    }
}

/// Converts cells to numbers: plain parse first, then each range lookup in
/// registration order.
#[derive(Debug, Clone)]
pub struct NumericCoercer {
    lookups: Vec<Arc<dyn RangeLookup>>,
}

impl Default for NumericCoercer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl NumericCoercer {
    /// A coercer without any bucket vocabulary.
    pub fn plain() -> Self {
        Self {
            lookups: Vec::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut coercer = Self::plain();
        if !config.range_table.is_empty() {
            let table = config
                .range_table
                .clone()
                .with_open_ended_factor(config.open_ended_factor);
            coercer = coercer.with_lookup(Arc::new(table));
        }
        if config.use_bucket_patterns {
            coercer = coercer.with_lookup(Arc::new(BucketPatternLookup::new(
                config.open_ended_factor,
            )));
        }
        coercer
    }

    /// Append a lookup. Earlier lookups take precedence.
    pub fn with_lookup(mut self, lookup: Arc<dyn RangeLookup>) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn lookup_names(&self) -> Vec<&str> {
        self.lookups.iter().map(|l| l.name()).collect()
    }

    pub fn coerce_value(&self, value: &CellValue) -> CoercedValue {
        match value {
            CellValue::Null => CoercedValue::Missing,
            CellValue::Bool(_) => CoercedValue::NonNumeric,
            CellValue::Number(v) if v.is_finite() => CoercedValue::Value(*v),
            CellValue::Number(_) => CoercedValue::NonFinite,
            CellValue::Text(s) => self.coerce_str(s),
        }
    }

    fn coerce_str(&self, raw: &str) -> CoercedValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() || is_error_marker(trimmed) {
            return CoercedValue::Missing;
        }

        if let Some(v) = parse_numeric_string(trimmed) {
            return if v.is_finite() {
                CoercedValue::Value(v)
            } else {
                CoercedValue::NonFinite
            };
        }

        for lookup in &self.lookups {
            if let Some(v) = lookup.lookup(trimmed) {
                trace!(lookup = lookup.name(), raw = trimmed, value = v, "Mapped bucket label");
                return CoercedValue::Value(v);
            }
        }

        CoercedValue::NonNumeric
    }

    /// Coerce a whole column.
    pub fn coerce_numeric<'a, I>(&self, values: I) -> Coercion
    where
        I: IntoIterator<Item = &'a CellValue>,
    {
        let mut result = Coercion::default();
        for value in values {
            result.record(self.coerce_value(value));
        }
        result
    }

    /// Whether a cell coerces to a finite number.
    pub fn is_numeric(&self, value: &CellValue) -> bool {
        matches!(self.coerce_value(value), CoercedValue::Value(_))
    }
}

/// Coerce with the default income vocabulary and bucket patterns.
pub fn coerce_numeric(values: &[CellValue]) -> Coercion {
    NumericCoercer::default().coerce_numeric(values)
}
