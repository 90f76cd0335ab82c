//! Grouping of column names into sidebar sections.
//!
//! Sections come from an ordered rules table; a column lands in the first
//! section whose matcher accepts its name, or in [`OTHER_SECTION`].

use crate::error::{ChartError, Result};
use regex::Regex;
use serde::Serialize;

pub const OTHER_SECTION: &str = "Other";

/// Predicate on a column name. Text matchers are case-insensitive.
#[derive(Debug, Clone)]
pub enum ColumnMatcher {
    Exact(String),
    Prefix(String),
    Contains(String),
    Pattern(Regex),
}

impl ColumnMatcher {
    pub fn exact(name: &str) -> Self {
        ColumnMatcher::Exact(name.to_lowercase())
    }

    pub fn prefix(prefix: &str) -> Self {
        ColumnMatcher::Prefix(prefix.to_lowercase())
    }

    pub fn contains(fragment: &str) -> Self {
        ColumnMatcher::Contains(fragment.to_lowercase())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(ColumnMatcher::Pattern)
            .map_err(|e| ChartError::InvalidConfig(format!("invalid section pattern: {e}")))
    }

    pub fn matches(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        match self {
            ColumnMatcher::Exact(name) => lower == *name,
            ColumnMatcher::Prefix(prefix) => lower.starts_with(prefix.as_str()),
            ColumnMatcher::Contains(fragment) => lower.contains(fragment.as_str()),
            ColumnMatcher::Pattern(regex) => regex.is_match(column),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionRule {
    pub label: String,
    pub matcher: ColumnMatcher,
}

/// A section and its columns, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSection {
    pub label: String,
    pub columns: Vec<String>,
}

/// Ordered (label, matcher) rules.
#[derive(Debug, Clone, Default)]
pub struct SectionRules {
    rules: Vec<SectionRule>,
}

impl SectionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, label: impl Into<String>, matcher: ColumnMatcher) -> Self {
        self.rules.push(SectionRule {
            label: label.into(),
            matcher,
        });
        self
    }

    /// Rules for the serology survey export: demographics, serology,
    /// vaccination, infection history, and dates.
    pub fn epidemiological() -> Self {
        let mut rules = Self::new().rule(
            "Demographics",
            ColumnMatcher::Pattern(
                Regex::new(r"(?i)(?:^|[_\s.-])(?:age|alter|sex|gender|geschlecht)(?:$|[_\s.-])")
                    .expect("Invalid regex: demographic token"),
            ),
        );
        for fragment in ["education", "bildung"] {
            rules = rules.rule("Demographics", ColumnMatcher::contains(fragment));
        }
        for fragment in ["income", "einkommen", "household", "haushalt"] {
            rules = rules.rule("Demographics", ColumnMatcher::contains(fragment));
        }
        rules = rules.rule("Serology", ColumnMatcher::prefix("sero_"));
        for fragment in ["igg", "igm", "antibod", "antikoerper", "titer"] {
            rules = rules.rule("Serology", ColumnMatcher::contains(fragment));
        }
        for fragment in ["vacc", "impf", "dose"] {
            rules = rules.rule("Vaccination", ColumnMatcher::contains(fragment));
        }
        for fragment in ["infect", "covid", "pcr", "symptom"] {
            rules = rules.rule("Infection", ColumnMatcher::contains(fragment));
        }
        rules.rule(
            "Dates",
            ColumnMatcher::Pattern(
                Regex::new(r"(?i)date|time|_dt").expect("Invalid regex: date section"),
            ),
        )
    }

    /// Label of the first matching rule, or [`OTHER_SECTION`].
    pub fn section_of(&self, column: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(column))
            .map(|rule| rule.label.as_str())
            .unwrap_or(OTHER_SECTION)
    }

    /// Group `columns` by section. Sections appear in rule order with
    /// "Other" last; empty sections are omitted.
    pub fn group_columns<S: AsRef<str>>(&self, columns: &[S]) -> Vec<ColumnSection> {
        let mut sections: Vec<ColumnSection> = Vec::new();
        for rule in &self.rules {
            if !sections.iter().any(|s| s.label == rule.label) {
                sections.push(ColumnSection {
                    label: rule.label.clone(),
                    columns: Vec::new(),
                });
            }
        }
        if !sections.iter().any(|s| s.label == OTHER_SECTION) {
            sections.push(ColumnSection {
                label: OTHER_SECTION.to_string(),
                columns: Vec::new(),
            });
        }

        for column in columns {
            let column = column.as_ref();
            let label = self.section_of(column);
            if let Some(section) = sections.iter_mut().find(|s| s.label == label) {
                section.columns.push(column.to_string());
            }
        }

        sections.retain(|s| !s.columns.is_empty());
        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = SectionRules::new()
            .rule("A", ColumnMatcher::contains("x"))
            .rule("B", ColumnMatcher::prefix("x"));
        assert_eq!(rules.section_of("x_value"), "A");
        assert_eq!(rules.section_of("other"), OTHER_SECTION);
    }

    #[test]
    fn test_matchers() {
        assert!(ColumnMatcher::exact("Age").matches("AGE"));
        assert!(!ColumnMatcher::exact("age").matches("age_group"));
        assert!(ColumnMatcher::prefix("sero_").matches("SERO_igg"));
        assert!(ColumnMatcher::pattern(r"^q\d+$").unwrap().matches("q12"));
        assert!(ColumnMatcher::pattern("(").is_err());
    }

    #[test]
    fn test_group_columns_preserves_orders() {
        let columns = [
            "sample_date",
            "sero_igg",
            "age_group",
            "respondent_id",
            "sex",
            "vaccinated",
        ];
        let groups = SectionRules::epidemiological().group_columns(&columns);
        assert_eq!(
            groups,
            vec![
                ColumnSection {
                    label: "Demographics".into(),
                    columns: vec!["age_group".into(), "sex".into()],
                },
                ColumnSection {
                    label: "Serology".into(),
                    columns: vec!["sero_igg".into()],
                },
                ColumnSection {
                    label: "Vaccination".into(),
                    columns: vec!["vaccinated".into()],
                },
                ColumnSection {
                    label: "Dates".into(),
                    columns: vec!["sample_date".into()],
                },
                ColumnSection {
                    label: OTHER_SECTION.into(),
                    columns: vec!["respondent_id".into()],
                },
            ]
        );
    }

    #[test]
    fn test_demographic_tokens_need_word_edges() {
        let rules = SectionRules::epidemiological();
        assert_eq!(rules.section_of("age"), "Demographics");
        assert_eq!(rules.section_of("Alter"), "Demographics");
        assert_eq!(rules.section_of("mother_age"), "Demographics");
        assert_eq!(rules.section_of("sex-at-birth"), "Demographics");
        assert_eq!(rules.section_of("percentage"), OTHER_SECTION);
        assert_eq!(rules.section_of("dosage"), OTHER_SECTION);
        assert_eq!(rules.section_of("alternative"), OTHER_SECTION);
    }

    #[test]
    fn test_empty_rules_put_everything_in_other() {
        let groups = SectionRules::new().group_columns(&["a", "b"]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].columns, vec!["a".to_string(), "b".to_string()]);
    }
}
