//! Column profiling: type inference and section grouping.
//!
//! [`profile_dataset`] classifies every column once from its sample. The
//! resulting [`DatasetProfile`] is the per-dataset type cache the chart
//! builder consults on each redraw.

pub mod sections;
pub mod type_inference;

pub use sections::{ColumnMatcher, ColumnSection, OTHER_SECTION, SectionRule, SectionRules};
pub use type_inference::{TypeClassifier, classify, has_date_name_hint};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::types::ColumnType;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// What the profiler learned about one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    /// Non-missing values drawn for classification.
    pub sampled: usize,
    /// Distinct labels among the sampled values.
    pub distinct: usize,
    pub missing: usize,
}

/// Profiles of all columns, in dataset column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
}

impl DatasetProfile {
    /// Build a profile from known types, for callers that already classified
    /// their columns.
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let columns = types
            .into_iter()
            .map(|(name, column_type)| ColumnProfile {
                name: name.into(),
                column_type,
                sampled: 0,
                distinct: 0,
                missing: 0,
            })
            .collect();
        Self { rows: 0, columns }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == column)
    }

    /// Cached type of `column`; unknown columns are `Other`.
    pub fn column_type(&self, column: &str) -> ColumnType {
        self.get(column)
            .map(|c| c.column_type)
            .unwrap_or(ColumnType::Other)
    }

    pub fn columns_of_type(&self, column_type: ColumnType) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(move |c| c.column_type == column_type)
            .map(|c| c.name.as_str())
    }
}

/// Classify every column of `dataset`.
pub fn profile_dataset(dataset: &Dataset, config: &PipelineConfig) -> DatasetProfile {
    let classifier = TypeClassifier::from_config(config);
    let sample_cap = config
        .inference
        .numeric_sample_cap
        .max(config.inference.date_sample_cap);

    let columns: Vec<ColumnProfile> = dataset
        .columns()
        .iter()
        .map(|name| {
            let samples = dataset.sample_values(name, sample_cap);
            let column_type = classifier.classify(name, &samples);
            let distinct = samples
                .iter()
                .filter_map(|v| v.label())
                .collect::<HashSet<_>>()
                .len();
            let missing = dataset
                .rows()
                .iter()
                .filter(|row| row.get(name).is_missing())
                .count();

            debug!(column = %name, %column_type, sampled = samples.len(), "Classified column");
            ColumnProfile {
                name: name.clone(),
                column_type,
                sampled: samples.len(),
                distinct,
                missing,
            }
        })
        .collect();

    info!(
        "Profiled {} columns over {} rows",
        columns.len(),
        dataset.len()
    );

    DatasetProfile {
        rows: dataset.len(),
        columns,
    }
}
