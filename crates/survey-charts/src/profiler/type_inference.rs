//! Semantic column type inference from sampled values.

use crate::coercion::NumericCoercer;
use crate::config::{InferenceSettings, PipelineConfig};
use crate::temporal::DateNormalizer;
use crate::types::{CellValue, ColumnType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::trace;

// "date", "time" (covers "_time" and "timestamp"), or "_dt"
static DATE_NAME_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date|time|_dt").expect("Invalid regex: date name hint"));

/// Whether a column name suggests it holds dates.
pub fn has_date_name_hint(name: &str) -> bool {
    DATE_NAME_HINT.is_match(name)
}

/// Classifies columns as numeric, categorical, date or other.
///
/// Classification is a pure function of the column name and the sample, so
/// results can be cached per column.
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    settings: InferenceSettings,
    dates: DateNormalizer,
    coercer: NumericCoercer,
}

impl Default for TypeClassifier {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl TypeClassifier {
    pub fn new(
        settings: InferenceSettings,
        dates: DateNormalizer,
        coercer: NumericCoercer,
    ) -> Self {
        Self {
            settings,
            dates,
            coercer,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.inference.clone(),
            DateNormalizer::from_config(config),
            NumericCoercer::from_config(config),
        )
    }

    /// Infer the type of `name` from `samples`.
    ///
    /// Missing values are skipped. An empty sample is `Other`.
    pub fn classify(&self, name: &str, samples: &[&CellValue]) -> ColumnType {
        let present: Vec<&CellValue> = samples
            .iter()
            .copied()
            .filter(|v| !v.is_missing())
            .collect();
        if present.is_empty() {
            return ColumnType::Other;
        }

        if has_date_name_hint(name) && self.looks_like_dates(&present) {
            return ColumnType::Date;
        }

        let numeric_sample = &present[..present.len().min(self.settings.numeric_sample_cap)];
        let numeric = numeric_sample
            .iter()
            .filter(|v| self.coercer.is_numeric(v))
            .count();
        let share = numeric as f64 / numeric_sample.len() as f64;
        trace!(column = name, share, "Numeric share");
        if share >= self.settings.parse_threshold {
            return ColumnType::Numeric;
        }

        let distinct: HashSet<String> = numeric_sample
            .iter()
            .filter(|v| !self.coercer.is_numeric(v))
            .filter_map(|v| v.label())
            .collect();
        if (self.settings.min_categories..=self.settings.max_categories).contains(&distinct.len()) {
            return ColumnType::Categorical;
        }

        ColumnType::Other
    }

    fn looks_like_dates(&self, present: &[&CellValue]) -> bool {
        let considered: Vec<&&CellValue> = present
            .iter()
            .take(self.settings.date_sample_cap)
            .take(self.settings.date_values_considered)
            .collect();
        if considered.is_empty() {
            return false;
        }
        let parsed = considered
            .iter()
            .filter(|v| self.dates.is_valid_date(v))
            .count();
        parsed as f64 / considered.len() as f64 >= self.settings.parse_threshold
    }
}

/// Classify with default settings.
pub fn classify(name: &str, samples: &[&CellValue]) -> ColumnType {
    TypeClassifier::default().classify(name, samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_strs(name: &str, raw: &[&str]) -> ColumnType {
        let cells: Vec<CellValue> = raw.iter().map(|s| CellValue::from(*s)).collect();
        let refs: Vec<&CellValue> = cells.iter().collect();
        classify(name, &refs)
    }

    // ==================== classify tests ====================

    #[test]
    fn test_numeric_column() {
        assert_eq!(classify_strs("age", &["23", "45", "31", "n/a"]), ColumnType::Numeric);
    }

    #[test]
    fn test_income_buckets_are_numeric() {
        assert_eq!(
            classify_strs(
                "income",
                &["1000 bis unter 2000 Euro", "8000 Euro und mehr", "unter 500 Euro"]
            ),
            ColumnType::Numeric
        );
    }

    #[test]
    fn test_categorical_column() {
        assert_eq!(
            classify_strs("age_group", &["18-29", "30-39", "18-29", "40-49"]),
            ColumnType::Categorical
        );
    }

    #[test]
    fn test_date_needs_name_hint() {
        let values = ["2021-03-01", "2021-04-01", "2021-05-01"];
        assert_eq!(classify_strs("sample_date", &values), ColumnType::Date);
        assert_eq!(classify_strs("visit_dt", &values), ColumnType::Date);
        // without a hint, three distinct strings are categories
        assert_eq!(classify_strs("visit", &values), ColumnType::Categorical);
    }

    #[test]
    fn test_dates_outside_window_are_not_dates() {
        let values = ["1899-01-01", "1900-01-01", "1901-01-01"];
        assert_ne!(classify_strs("birth_date", &values), ColumnType::Date);
    }

    #[test]
    fn test_threshold_boundary() {
        // 7 of 10 numeric is exactly 70%
        let mut values = vec!["1", "2", "3", "4", "5", "6", "7"];
        values.extend(["a", "b", "c"]);
        assert_eq!(classify_strs("score", &values), ColumnType::Numeric);

        let mut below = vec!["1", "2", "3", "4", "5", "6"];
        below.extend(["a", "b", "c", "d"]);
        assert_eq!(classify_strs("score", &below), ColumnType::Categorical);
    }

    #[test]
    fn test_other_fallbacks() {
        assert_eq!(classify_strs("empty", &["", " "]), ColumnType::Other);
        assert_eq!(classify_strs("constant", &["x", "x", "x"]), ColumnType::Other);
        let many: Vec<String> = (0..30).map(|i| format!("id-{i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        assert_eq!(classify_strs("free_text", &refs), ColumnType::Other);
    }

    #[test]
    fn test_booleans_are_categorical() {
        let cells = [CellValue::Bool(true), CellValue::Bool(false), CellValue::Bool(true)];
        let refs: Vec<&CellValue> = cells.iter().collect();
        assert_eq!(classify("consent", &refs), ColumnType::Categorical);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let values = ["3", "x", "4", "y", "5"];
        assert_eq!(classify_strs("mixed", &values), classify_strs("mixed", &values));
    }
}
