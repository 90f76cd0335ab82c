//! Grouping and reduction of row sets.
//!
//! Rows are keyed once by a caller-supplied function (category label, bin
//! membership, or period bucket), then each group's value column is coerced
//! and reduced. Groups are emitted in a deterministic order: categories
//! lexicographically, bins by index, periods chronologically.

use crate::binning::Bin;
use crate::coercion::NumericCoercer;
use crate::dataset::Row;
use crate::error::{ChartError, Result};
use crate::statistics::{mean, median};
use crate::temporal::compare_period_keys;
use crate::types::{Aggregation, Datum, Period};
use crate::utils::format_number;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Discrete key a row is grouped under.
#[derive(Debug, Clone)]
pub enum GroupKey {
    Category(String),
    Bin(Bin),
    Period { key: String, period: Period },
}

impl GroupKey {
    fn rank(&self) -> u8 {
        match self {
            GroupKey::Category(_) => 0,
            GroupKey::Bin(_) => 1,
            GroupKey::Period { .. } => 2,
        }
    }

    /// Display label for axes and warnings.
    pub fn label(&self) -> String {
        match self {
            GroupKey::Category(label) => label.clone(),
            GroupKey::Bin(bin) => format_number(bin.center),
            GroupKey::Period { key, .. } => key.clone(),
        }
    }

    /// Axis coordinate: bin centers are numeric, everything else is text.
    pub fn datum(&self) -> Datum {
        match self {
            GroupKey::Bin(bin) => Datum::Number(bin.center),
            other => Datum::Text(other.label()),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Category(a), GroupKey::Category(b)) => a.cmp(b),
            (GroupKey::Bin(a), GroupKey::Bin(b)) => a.index.cmp(&b.index),
            (
                GroupKey::Period { key: a, period },
                GroupKey::Period { key: b, .. },
            ) => compare_period_keys(a, b, *period),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// One reduced group.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateGroup {
    pub key: GroupKey,
    /// Reduced value. `None` for mean/median over an empty coerced set.
    pub value: Option<f64>,
    /// Values that contributed to `value` (rows, for count).
    pub n: usize,
    /// Rows keyed into this group.
    pub rows: usize,
    /// Rows whose value cell did not coerce.
    pub excluded: usize,
    /// Set when the value column had no usable value in this group; `value`
    /// is then not a real measurement even if it reads 0.
    pub insufficient_data: bool,
    /// Coerced values, kept for interval and box computations.
    pub values: Vec<f64>,
}

/// Groups in emission order plus rows that produced no key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResult {
    pub groups: Vec<AggregateGroup>,
    pub unkeyed: usize,
}

impl AggregationResult {
    pub fn excluded(&self) -> usize {
        self.groups.iter().map(|g| g.excluded).sum()
    }

    pub fn insufficient(&self) -> impl Iterator<Item = &AggregateGroup> {
        self.groups.iter().filter(|g| g.insufficient_data)
    }

    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(|g| g.rows).sum()
    }
}

fn reduce(kind: Aggregation, values: &[f64]) -> Option<f64> {
    match kind {
        Aggregation::Count => Some(values.len() as f64),
        Aggregation::Sum => Some(values.iter().sum()),
        Aggregation::Mean => mean(values),
        Aggregation::Median => median(values),
    }
}

/// Group `rows` by `key_fn` and reduce each group's `value_column`.
///
/// `count` is the group size regardless of the value column. The other
/// reductions need `value_column`; an empty coerced set reports `Some(0.0)`
/// for sum and `None` for mean/median, and is flagged as insufficient either
/// way.
pub fn aggregate<F>(
    rows: &[&Row],
    mut key_fn: F,
    value_column: Option<&str>,
    kind: Aggregation,
    coercer: &NumericCoercer,
) -> Result<AggregationResult>
where
    F: FnMut(&Row) -> Option<GroupKey>,
{
    if kind != Aggregation::Count && value_column.is_none() {
        return Err(ChartError::InvalidConfig(format!(
            "aggregation '{kind}' requires a value column"
        )));
    }

    let mut buckets: BTreeMap<GroupKey, Vec<&Row>> = BTreeMap::new();
    let mut unkeyed = 0;
    for row in rows {
        match key_fn(row) {
            Some(key) => buckets.entry(key).or_default().push(row),
            None => unkeyed += 1,
        }
    }

    let groups = buckets
        .into_iter()
        .map(|(key, members)| {
            let coercion = value_column
                .map(|column| coercer.coerce_numeric(members.iter().map(|row| row.get(column))))
                .unwrap_or_default();

            if kind == Aggregation::Count {
                return AggregateGroup {
                    key,
                    value: Some(members.len() as f64),
                    n: members.len(),
                    rows: members.len(),
                    excluded: 0,
                    insufficient_data: false,
                    values: coercion.values,
                };
            }

            let insufficient_data = coercion.values.is_empty();
            AggregateGroup {
                key,
                value: reduce(kind, &coercion.values),
                n: coercion.values.len(),
                rows: members.len(),
                excluded: coercion.excluded,
                insufficient_data,
                values: coercion.values,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        groups = groups.len(),
        unkeyed,
        aggregation = %kind,
        "Aggregated rows"
    );

    Ok(AggregationResult { groups, unkeyed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;
    use pretty_assertions::assert_eq;

    fn row(group: &str, value: &str) -> Row {
        [("group", CellValue::from(group)), ("value", CellValue::from(value))]
            .into_iter()
            .collect()
    }

    fn by_group(row: &Row) -> Option<GroupKey> {
        row.get("group").label().map(GroupKey::Category)
    }

    fn run(rows: &[Row], column: Option<&str>, kind: Aggregation) -> AggregationResult {
        let refs: Vec<&Row> = rows.iter().collect();
        aggregate(&refs, by_group, column, kind, &NumericCoercer::default()).unwrap()
    }

    // ==================== aggregate tests ====================

    #[test]
    fn test_count_ignores_value_validity() {
        let rows = vec![row("a", "x"), row("a", ""), row("b", "3")];
        let result = run(&rows, Some("value"), Aggregation::Count);
        let counts: Vec<(String, Option<f64>)> = result
            .groups
            .iter()
            .map(|g| (g.key.label(), g.value))
            .collect();
        assert_eq!(
            counts,
            vec![("a".to_string(), Some(2.0)), ("b".to_string(), Some(1.0))]
        );
        assert!(result.insufficient().next().is_none());
    }

    #[test]
    fn test_mean_of_unmapped_strings_is_flagged() {
        let rows = vec![row("a", "viel"), row("a", "wenig"), row("b", "4")];
        let result = run(&rows, Some("value"), Aggregation::Mean);
        let a = &result.groups[0];
        assert_eq!(a.value, None);
        assert!(a.insufficient_data);
        assert_eq!(a.excluded, 2);
        assert_eq!(a.n, 0);
        assert_eq!(result.groups[1].value, Some(4.0));
    }

    #[test]
    fn test_sum_of_empty_set_is_zero_but_flagged() {
        let rows = vec![row("a", "n/a")];
        let result = run(&rows, Some("value"), Aggregation::Sum);
        assert_eq!(result.groups[0].value, Some(0.0));
        assert!(result.groups[0].insufficient_data);
    }

    #[test]
    fn test_median_even_group() {
        let rows = vec![row("a", "1"), row("a", "2"), row("a", "10"), row("a", "4")];
        let result = run(&rows, Some("value"), Aggregation::Median);
        assert_eq!(result.groups[0].value, Some(3.0));
        assert_eq!(result.groups[0].n, 4);
    }

    #[test]
    fn test_groups_emitted_lexicographically() {
        let rows = vec![row("c", "1"), row("a", "1"), row("b", "1")];
        let result = run(&rows, None, Aggregation::Count);
        let labels: Vec<String> = result.groups.iter().map(|g| g.key.label()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unkeyed_rows_are_counted() {
        let rows = vec![row("", "1"), row("a", "1")];
        let result = run(&rows, None, Aggregation::Count);
        assert_eq!(result.unkeyed, 1);
        assert_eq!(result.groups.len(), 1);
    }

    #[test]
    fn test_value_aggregation_requires_column() {
        let rows = vec![row("a", "1")];
        let refs: Vec<&Row> = rows.iter().collect();
        let err = aggregate(&refs, by_group, None, Aggregation::Mean, &NumericCoercer::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    // ==================== GroupKey ordering tests ====================

    #[test]
    fn test_bins_sort_by_index() {
        let bin = |index: usize| {
            GroupKey::Bin(Bin {
                center: 100.0 - index as f64,
                width: 1.0,
                lower: 99.5 - index as f64,
                upper: 100.5 - index as f64,
                index,
            })
        };
        let mut keys = vec![bin(2), bin(0), bin(1)];
        keys.sort();
        let indexes: Vec<usize> = keys
            .iter()
            .map(|k| match k {
                GroupKey::Bin(b) => b.index,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn test_quarters_sort_chronologically() {
        let quarter = |key: &str| GroupKey::Period {
            key: key.to_string(),
            period: Period::Quarter,
        };
        let mut keys = vec![quarter("Q1 2022"), quarter("Q4 2021"), quarter("Q2 2021")];
        keys.sort();
        let labels: Vec<String> = keys.iter().map(GroupKey::label).collect();
        assert_eq!(labels, vec!["Q2 2021", "Q4 2021", "Q1 2022"]);
    }
}
