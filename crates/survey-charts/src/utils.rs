//! Shared utilities for the chart pipeline.
//!
//! String cleaning, missing-value markers, boolean spellings, and number
//! formatting used by coercion, filtering, and label generation.

use once_cell::sync::Lazy;
use polars::prelude::DataType;
use regex::Regex;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a polars DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 5] = ['$', '%', '€', '£', ' '];

/// Common error/missing value markers in survey exports.
pub const ERROR_MARKERS: [&str; 12] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a", "-", "k.a.",
    "keine angabe",
];

// Comma is a thousands separator only when it groups digits in threes.
static THOUSANDS_GROUPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("Invalid regex: thousands grouping")
});

/// Clean a string for numeric parsing by removing formatting characters.
///
/// Commas are removed only when they are thousands separators, so a decimal
/// comma such as `"1,5"` stays unparseable instead of silently becoming 15.
///
/// # Example
///
/// ```rust,ignore
/// use survey_charts::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// assert_eq!(clean_numeric_string("  42%  "), "42");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    if THOUSANDS_GROUPED.is_match(&result) {
        result = result.replace(',', "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles currency symbols, percentages, and thousands separators. Returns
/// non-finite values (`"inf"`, `"NaN"`) as parsed; callers decide whether to
/// keep them.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Check if a string can be parsed as a finite numeric value.
pub fn is_numeric_string(s: &str) -> bool {
    parse_numeric_string(s).is_some_and(f64::is_finite)
}

/// Format a number for labels: integers without a fractional part, other
/// values with at most four decimals and no trailing zeros.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

// =============================================================================
// Boolean Detection Utilities
// =============================================================================

/// Common boolean true representations (including German survey answers).
pub const BOOLEAN_TRUE_VALUES: [&str; 9] =
    ["true", "yes", "1", "t", "y", "on", "ja", "checked", "x"];

/// Common boolean false representations.
pub const BOOLEAN_FALSE_VALUES: [&str; 8] =
    ["false", "no", "0", "f", "n", "off", "nein", "unchecked"];

/// Check if a string represents a boolean true value.
pub fn is_boolean_true(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    BOOLEAN_TRUE_VALUES.iter().any(|&v| v == lower)
}

/// Check if a string represents a boolean false value.
pub fn is_boolean_false(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    BOOLEAN_FALSE_VALUES.iter().any(|&v| v == lower)
}

/// Parse a boolean spelling, `None` when the string is neither.
pub fn parse_boolean_string(s: &str) -> Option<bool> {
    if is_boolean_true(s) {
        Some(true)
    } else if is_boolean_false(s) {
        Some(false)
    } else {
        None
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
        assert_eq!(clean_numeric_string("1 000"), "1000");
    }

    #[test]
    fn test_clean_numeric_string_keeps_decimal_comma() {
        // "1,5" is not thousands-grouped, so it must not collapse to 15
        assert_eq!(clean_numeric_string("1,5"), "1,5");
        assert_eq!(parse_numeric_string("1,5"), None);
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("ERROR"));
        assert!(is_error_marker("N/A"));
        assert!(is_error_marker("  Keine Angabe  "));
        assert!(!is_error_marker("42"));
        assert!(!is_error_marker("hello"));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("hello"), None);
    }

    #[test]
    fn test_is_numeric_string_rejects_non_finite() {
        assert!(is_numeric_string("3.5"));
        assert!(!is_numeric_string("inf"));
        assert!(!is_numeric_string("NaN"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.123456), "0.1235");
        assert_eq!(format_number(-2.0), "-2");
    }

    #[test]
    fn test_parse_boolean_string() {
        assert_eq!(parse_boolean_string("true"), Some(true));
        assert_eq!(parse_boolean_string("Ja"), Some(true));
        assert_eq!(parse_boolean_string("0"), Some(false));
        assert_eq!(parse_boolean_string("maybe"), None);
    }
}
