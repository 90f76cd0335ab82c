//! Lookups that map ordinal bucket strings to representative numbers.
//!
//! Survey exports encode ranges such as "1000 bis unter 2000 Euro" as text.
//! A [`RangeLookup`] turns those into a single value (the range midpoint, or
//! an explicit estimate for open-ended buckets) so they can be aggregated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Maps a raw bucket label to a representative number.
///
/// Implementations must be pure: the same label always yields the same value.
pub trait RangeLookup: Debug + Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Representative value for `raw`, or `None` if the label is not covered.
    fn lookup(&self, raw: &str) -> Option<f64>;
}

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// Explicit table
// ============================================================================

/// Explicit label to value table, injectable through configuration.
///
/// Open-ended buckets ("8000 Euro und mehr") are stored by their lower bound
/// and scaled by `open_ended_factor` at lookup time, so the factor configured
/// on the pipeline applies to listed labels too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTable {
    #[serde(default)]
    pub entries: BTreeMap<String, f64>,

    /// Open-ended bucket label to its lower bound.
    #[serde(default)]
    pub open_ended: BTreeMap<String, f64>,

    #[serde(skip, default = "default_open_ended_factor")]
    open_ended_factor: f64,
}

fn default_open_ended_factor() -> f64 {
    1.5
}

impl Default for RangeTable {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            open_ended: BTreeMap::new(),
            open_ended_factor: default_open_ended_factor(),
        }
    }
}

impl RangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, label: impl AsRef<str>, value: f64) -> Self {
        self.insert(label, value);
        self
    }

    pub fn insert(&mut self, label: impl AsRef<str>, value: f64) {
        self.entries.insert(normalize_label(label.as_ref()), value);
    }

    /// Add an open-ended bucket whose value is `lower_bound * open_ended_factor`.
    pub fn with_open_ended(mut self, label: impl AsRef<str>, lower_bound: f64) -> Self {
        self.insert_open_ended(label, lower_bound);
        self
    }

    pub fn insert_open_ended(&mut self, label: impl AsRef<str>, lower_bound: f64) {
        self.open_ended
            .insert(normalize_label(label.as_ref()), lower_bound);
    }

    pub fn with_open_ended_factor(mut self, factor: f64) -> Self {
        self.open_ended_factor = factor;
        self
    }

    pub fn open_ended_factor(&self) -> f64 {
        self.open_ended_factor
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.open_ended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.open_ended.is_empty()
    }

    /// Household net income buckets used by the serology survey, in German
    /// and English spellings.
    pub fn income_default() -> Self {
        const BUCKETS: [(Option<f64>, Option<f64>); 8] = [
            (None, Some(500.0)),
            (Some(500.0), Some(1000.0)),
            (Some(1000.0), Some(2000.0)),
            (Some(2000.0), Some(3000.0)),
            (Some(3000.0), Some(4000.0)),
            (Some(4000.0), Some(5000.0)),
            (Some(5000.0), Some(8000.0)),
            (Some(8000.0), None),
        ];

        let mut table = Self::new();
        for (lower, upper) in BUCKETS {
            match (lower, upper) {
                (None, Some(hi)) => {
                    let value = hi / 2.0;
                    table.insert(format!("unter {hi} Euro"), value);
                    table.insert(format!("less than {hi} Euro"), value);
                }
                (Some(lo), Some(hi)) => {
                    let value = (lo + hi) / 2.0;
                    table.insert(format!("{lo} bis unter {hi} Euro"), value);
                    table.insert(format!("{lo} to under {hi} Euro"), value);
                }
                (Some(lo), None) => {
                    table.insert_open_ended(format!("{lo} Euro und mehr"), lo);
                    table.insert_open_ended(format!("{lo} Euro or more"), lo);
                }
                (None, None) => {}
            }
        }
        table
    }

    /// Look up a raw label. Keys loaded from JSON may not be normalized yet,
    /// so a normalized scan follows the direct hit.
    pub fn lookup_value(&self, raw: &str) -> Option<f64> {
        let key = normalize_label(raw);
        if let Some(value) = find_label(&self.entries, &key) {
            return Some(value);
        }
        find_label(&self.open_ended, &key).map(|lo| lo * self.open_ended_factor)
    }
}

fn find_label(map: &BTreeMap<String, f64>, key: &str) -> Option<f64> {
    if let Some(value) = map.get(key) {
        return Some(*value);
    }
    map.iter()
        .find(|(label, _)| normalize_label(label) == key)
        .map(|(_, value)| *value)
}

impl RangeLookup for RangeTable {
    fn name(&self) -> &str {
        "range_table"
    }

    fn lookup(&self, raw: &str) -> Option<f64> {
        self.lookup_value(raw)
    }
}

// ============================================================================
// Pattern-based parsing
// ============================================================================

const NUM: &str = r"(\d[\d.,]*)";
const UNIT: &str = r"(?:\s*(?:€|euro|eur|\$|usd|jahre|years))?";
const CURRENCY: &str = r"\s*(?:€|euro|eur|\$|usd)";

static BOUNDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:von\s+)?{NUM}{UNIT}\s+(?:bis unter|bis unterhalb|to under|to less than|to below)\s+{NUM}{UNIT}$"
    ))
    .expect("Invalid regex: bounded bucket")
});

// Bare "bis"/"to" only reads as a bucket with a currency, so "18 to 29" stays a label
static BOUNDED_CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:von\s+)?{NUM}(?:{CURRENCY})?\s+(?:bis|to)\s+{NUM}{CURRENCY}$"
    ))
    .expect("Invalid regex: currency bucket")
});

static OPEN_UPPER_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{NUM}{UNIT}\s*(?:und mehr|und darüber|oder mehr|or more|and more|and above|\+)$"
    ))
    .expect("Invalid regex: open upper bucket")
});

static OPEN_UPPER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:über|ueber|mehr als|ab|more than|over|above)\s+{NUM}{UNIT}$"
    ))
    .expect("Invalid regex: open upper prefix bucket")
});

static OPEN_LOWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:unter|weniger als|under|less than|below)\s+{NUM}{UNIT}$"
    ))
    .expect("Invalid regex: open lower bucket")
});

static DOT_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(\.\d{3})+$").expect("Invalid regex: dot grouping"));

static COMMA_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(,\d{3})+$").expect("Invalid regex: comma grouping"));

/// Parse a bucket bound, accepting German (`8.000`) and English (`8,000`)
/// thousands grouping and a decimal comma.
fn parse_bound(raw: &str) -> Option<f64> {
    let cleaned = if DOT_GROUPED.is_match(raw) {
        raw.replace('.', "")
    } else if COMMA_GROUPED.is_match(raw) {
        raw.replace(',', "")
    } else {
        raw.replace(',', ".")
    };
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses bucket labels by shape rather than by exact spelling:
///
/// - `A bis unter B` / `A to under B` / `A bis B Euro` → midpoint
/// - `A und mehr` / `A or more` / `über A` → `A * open_ended_factor`
/// - `unter B` / `under B` → `B / 2`
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPatternLookup {
    open_ended_factor: f64,
}

impl Default for BucketPatternLookup {
    fn default() -> Self {
        Self {
            open_ended_factor: 1.5,
        }
    }
}

impl BucketPatternLookup {
    pub fn new(open_ended_factor: f64) -> Self {
        Self { open_ended_factor }
    }
}

impl RangeLookup for BucketPatternLookup {
    fn name(&self) -> &str {
        "bucket_pattern"
    }

    fn lookup(&self, raw: &str) -> Option<f64> {
        let label = normalize_label(raw);

        if let Some(caps) = BOUNDED
            .captures(&label)
            .or_else(|| BOUNDED_CURRENCY.captures(&label))
        {
            let lo = parse_bound(&caps[1])?;
            let hi = parse_bound(&caps[2])?;
            if hi < lo {
                return None;
            }
            return Some((lo + hi) / 2.0);
        }

        if let Some(caps) = OPEN_UPPER_SUFFIX
            .captures(&label)
            .or_else(|| OPEN_UPPER_PREFIX.captures(&label))
        {
            return parse_bound(&caps[1]).map(|lo| lo * self.open_ended_factor);
        }

        if let Some(caps) = OPEN_LOWER.captures(&label) {
            return parse_bound(&caps[1]).map(|hi| hi / 2.0);
        }

        None
    }
}
