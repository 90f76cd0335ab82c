//! Row filters resolved once per selection.
//!
//! The dashboard's filter widgets hand over loosely typed selections: `"1"`,
//! `1` and `true` can all mean the same checkbox state. [`Filter::resolve`]
//! decides the filter kind once, from the column's inferred type and the
//! selection's shape, so matching never re-interprets the selection.

use crate::coercion::NumericCoercer;
use crate::config::PipelineConfig;
use crate::dataset::Row;
use crate::error::{ChartError, Result};
use crate::temporal::DateNormalizer;
use crate::types::{CellValue, ColumnType};
use crate::utils::parse_boolean_string;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// A filter condition with its kind fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterCondition {
    /// Inclusive numeric bounds; an absent bound is open.
    NumericRange { min: Option<f64>, max: Option<f64> },
    CategorySet { values: BTreeSet<String> },
    Boolean { value: bool },
    /// Inclusive calendar-date bounds; an absent bound is open.
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

/// A condition bound to a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub condition: FilterCondition,
}

fn invalid(column: &str, reason: impl Into<String>) -> ChartError {
    ChartError::InvalidFilter {
        column: column.to_string(),
        reason: reason.into(),
    }
}

fn bound_f64(column: &str, value: Option<&Value>) -> Result<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(column, format!("'{s}' is not a number"))),
        Some(other) => Err(invalid(column, format!("{other} is not a numeric bound"))),
    }
}

fn bound_date(
    column: &str,
    value: Option<&Value>,
    dates: &DateNormalizer,
) -> Result<Option<NaiveDate>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => dates
            .parse_valid_date(&CellValue::from(s.as_str()))
            .map(|dt| Some(dt.date()))
            .ok_or_else(|| invalid(column, format!("'{s}' is not a valid date"))),
        Some(other) => Err(invalid(column, format!("{other} is not a date bound"))),
    }
}

/// Read a checkbox-style selection: `true`, `1`, `"1"`, `"yes"`, `"ja"`...
pub fn selection_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Some(true),
            Some(v) if v == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => parse_boolean_string(s),
        _ => None,
    }
}

fn category_label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => CellValue::from(s.as_str()).label(),
        Value::Number(n) => n.as_f64().and_then(|v| CellValue::Number(v).label()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Filter {
    pub fn new(column: impl Into<String>, condition: FilterCondition) -> Self {
        Self {
            column: column.into(),
            condition,
        }
    }

    /// Turn a raw UI selection into a typed filter.
    ///
    /// Returns `Ok(None)` for an empty selection (null, `[]`, `{}`), which
    /// means "no filter". A boolean selection, or `{"checked": v}` with any
    /// checkbox spelling of `v`, yields a boolean filter; otherwise the column
    /// type decides:
    ///
    /// - numeric: `{"min": a, "max": b}`, `[a, b]`, or a single value
    /// - date: `{"start": a, "end": b}` or `[a, b]`
    /// - categorical / other: a label or an array of labels
    pub fn resolve(
        column: impl Into<String>,
        column_type: ColumnType,
        selection: &Value,
    ) -> Result<Option<Self>> {
        Self::resolve_with(column, column_type, selection, &DateNormalizer::default())
    }

    pub fn resolve_with(
        column: impl Into<String>,
        column_type: ColumnType,
        selection: &Value,
        dates: &DateNormalizer,
    ) -> Result<Option<Self>> {
        let column = column.into();
        let is_empty = match selection {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if is_empty {
            return Ok(None);
        }

        if let Value::Bool(value) = selection {
            return Ok(Some(Self::new(column, FilterCondition::Boolean { value: *value })));
        }
        if let Value::Object(map) = selection
            && let Some(flag) = map.get("checked")
        {
            let value = selection_as_bool(flag)
                .ok_or_else(|| invalid(&column, format!("{flag} is not a checkbox state")))?;
            return Ok(Some(Self::new(column, FilterCondition::Boolean { value })));
        }

        let condition = match column_type {
            ColumnType::Numeric => {
                let (min, max) = match selection {
                    Value::Object(map) => (
                        bound_f64(&column, map.get("min"))?,
                        bound_f64(&column, map.get("max"))?,
                    ),
                    Value::Array(items) if items.len() == 2 => (
                        bound_f64(&column, items.first())?,
                        bound_f64(&column, items.get(1))?,
                    ),
                    Value::Number(_) | Value::String(_) => {
                        let exact = bound_f64(&column, Some(selection))?;
                        (exact, exact)
                    }
                    other => {
                        return Err(invalid(
                            &column,
                            format!("unsupported numeric selection {other}"),
                        ));
                    }
                };
                if let (Some(lo), Some(hi)) = (min, max)
                    && lo > hi
                {
                    return Err(invalid(&column, format!("min {lo} is greater than max {hi}")));
                }
                FilterCondition::NumericRange { min, max }
            }
            ColumnType::Date => {
                let (start, end) = match selection {
                    Value::Object(map) => (
                        bound_date(&column, map.get("start"), dates)?,
                        bound_date(&column, map.get("end"), dates)?,
                    ),
                    Value::Array(items) if items.len() == 2 => (
                        bound_date(&column, items.first(), dates)?,
                        bound_date(&column, items.get(1), dates)?,
                    ),
                    other => {
                        return Err(invalid(&column, format!("unsupported date selection {other}")));
                    }
                };
                if let (Some(s), Some(e)) = (start, end)
                    && s > e
                {
                    return Err(invalid(&column, format!("start {s} is after end {e}")));
                }
                FilterCondition::DateRange { start, end }
            }
            ColumnType::Categorical | ColumnType::Other => {
                let values: BTreeSet<String> = match selection {
                    Value::Array(items) => items.iter().filter_map(category_label).collect(),
                    single => category_label(single).into_iter().collect(),
                };
                if values.is_empty() {
                    return Err(invalid(&column, "no usable category labels in selection"));
                }
                FilterCondition::CategorySet { values }
            }
        };

        Ok(Some(Self::new(column, condition)))
    }

    /// Whether `row` passes. Values that cannot be read as the filter's kind
    /// fail the filter.
    pub fn matches(&self, row: &Row, dates: &DateNormalizer, coercer: &NumericCoercer) -> bool {
        let cell = row.get(&self.column);
        match &self.condition {
            FilterCondition::NumericRange { min, max } => match coercer.coerce_value(cell).value() {
                Some(v) => min.is_none_or(|lo| v >= lo) && max.is_none_or(|hi| v <= hi),
                None => false,
            },
            FilterCondition::CategorySet { values } => {
                cell.label().is_some_and(|label| values.contains(&label))
            }
            FilterCondition::Boolean { value } => {
                let parsed = match cell {
                    CellValue::Bool(b) => Some(*b),
                    CellValue::Number(n) if *n == 1.0 => Some(true),
                    CellValue::Number(n) if *n == 0.0 => Some(false),
                    CellValue::Text(s) => parse_boolean_string(s),
                    _ => None,
                };
                parsed == Some(*value)
            }
            FilterCondition::DateRange { start, end } => match dates.parse_valid_date(cell) {
                Some(instant) => {
                    let date = instant.date();
                    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
                }
                None => false,
            },
        }
    }
}

/// Conjunction of filters applied to a row sequence.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
    dates: DateNormalizer,
    coercer: NumericCoercer,
}

impl FilterSet {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            filters: Vec::new(),
            dates: DateNormalizer::from_config(config),
            coercer: NumericCoercer::from_config(config),
        }
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|f| f.matches(row, &self.dates, &self.coercer))
    }

    /// Rows passing every filter, in input order.
    pub fn apply<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        let retained: Vec<&Row> = rows.iter().filter(|row| self.matches(row)).collect();
        debug!(
            filters = self.filters.len(),
            input = rows.len(),
            retained = retained.len(),
            "Applied filters"
        );
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Row> {
        vec![
            Row::new()
                .with("age", "25")
                .with("sex", "f")
                .with("vaccinated", "ja")
                .with("sample_date", "2021-03-15"),
            Row::new()
                .with("age", 41.0)
                .with("sex", "m")
                .with("vaccinated", 0.0)
                .with("sample_date", "2021-06-01"),
            Row::new()
                .with("age", "k.A.")
                .with("sex", "f")
                .with("vaccinated", true)
                .with("sample_date", "not recorded"),
        ]
    }

    fn apply(filter: Filter) -> Vec<usize> {
        let data = rows();
        let set = FilterSet::new(&PipelineConfig::default()).with(filter);
        let kept = set.apply(&data);
        data.iter()
            .enumerate()
            .filter(|(_, row)| kept.iter().any(|k| std::ptr::eq(*k, *row)))
            .map(|(i, _)| i)
            .collect()
    }

    // ==================== resolve tests ====================

    #[test]
    fn test_resolve_numeric_shapes() {
        let object = Filter::resolve("age", ColumnType::Numeric, &json!({"min": 18, "max": 30}))
            .unwrap()
            .unwrap();
        assert_eq!(
            object.condition,
            FilterCondition::NumericRange {
                min: Some(18.0),
                max: Some(30.0),
            }
        );

        let array = Filter::resolve("age", ColumnType::Numeric, &json!([null, "40"]))
            .unwrap()
            .unwrap();
        assert_eq!(
            array.condition,
            FilterCondition::NumericRange {
                min: None,
                max: Some(40.0),
            }
        );
    }

    #[test]
    fn test_resolve_rejects_inverted_range() {
        let err = Filter::resolve("age", ColumnType::Numeric, &json!({"min": 50, "max": 10}))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_FILTER");
    }

    #[test]
    fn test_resolve_empty_selection_is_no_filter() {
        assert!(Filter::resolve("sex", ColumnType::Categorical, &json!([])).unwrap().is_none());
        assert!(Filter::resolve("sex", ColumnType::Categorical, &Value::Null).unwrap().is_none());
    }

    #[test]
    fn test_resolve_boolean_selection() {
        let filter = Filter::resolve("vaccinated", ColumnType::Categorical, &json!(true))
            .unwrap()
            .unwrap();
        assert_eq!(filter.condition, FilterCondition::Boolean { value: true });
    }

    #[test]
    fn test_resolve_checkbox_object() {
        let filter = Filter::resolve("vaccinated", ColumnType::Other, &json!({"checked": "1"}))
            .unwrap()
            .unwrap();
        assert_eq!(filter.condition, FilterCondition::Boolean { value: true });
        assert!(
            Filter::resolve("vaccinated", ColumnType::Other, &json!({"checked": "?"})).is_err()
        );
    }

    #[test]
    fn test_resolve_bad_date() {
        let err = Filter::resolve("sample_date", ColumnType::Date, &json!({"start": "soon"}))
            .unwrap_err();
        assert!(err.to_string().contains("sample_date"));
    }

    #[test]
    fn test_selection_as_bool() {
        assert_eq!(selection_as_bool(&json!("1")), Some(true));
        assert_eq!(selection_as_bool(&json!(1)), Some(true));
        assert_eq!(selection_as_bool(&json!("nein")), Some(false));
        assert_eq!(selection_as_bool(&json!("maybe")), None);
    }

    // ==================== apply tests ====================

    #[test]
    fn test_numeric_range_drops_uninterpretable() {
        let filter = Filter::new(
            "age",
            FilterCondition::NumericRange {
                min: Some(20.0),
                max: None,
            },
        );
        assert_eq!(apply(filter), vec![0, 1]);
    }

    #[test]
    fn test_category_set() {
        let filter = Filter::resolve("sex", ColumnType::Categorical, &json!(["f"]))
            .unwrap()
            .unwrap();
        assert_eq!(apply(filter), vec![0, 2]);
    }

    #[test]
    fn test_boolean_accepts_mixed_spellings() {
        let yes = Filter::new("vaccinated", FilterCondition::Boolean { value: true });
        assert_eq!(apply(yes), vec![0, 2]);
        let no = Filter::new("vaccinated", FilterCondition::Boolean { value: false });
        assert_eq!(apply(no), vec![1]);
    }

    #[test]
    fn test_date_range_inclusive() {
        let filter = Filter::resolve(
            "sample_date",
            ColumnType::Date,
            &json!({"start": "2021-03-15", "end": "2021-05-31"}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(apply(filter), vec![0]);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let data = rows();
        let set = FilterSet::new(&PipelineConfig::default())
            .with(Filter::new("sex", FilterCondition::CategorySet {
                values: ["f".to_string()].into_iter().collect(),
            }))
            .with(Filter::new(
                "age",
                FilterCondition::NumericRange {
                    min: Some(0.0),
                    max: None,
                },
            ));
        assert_eq!(set.len(), 2);
        assert_eq!(set.apply(&data).len(), 1);
    }

    #[test]
    fn test_condition_serialization_is_tagged() {
        let json = serde_json::to_value(FilterCondition::Boolean { value: false }).unwrap();
        assert_eq!(json, json!({"kind": "boolean", "value": false}));
    }
}
