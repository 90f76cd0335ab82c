//! In-memory row sequence the chart pipeline reads from.
//!
//! Rows are immutable once loaded; filtering hands out references and never
//! copies or mutates them.

use crate::error::{Result, ResultExt};
use crate::types::CellValue;
use crate::utils::is_numeric_dtype;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

static NULL_CELL: CellValue = CellValue::Null;

/// One record keyed by column name. Absent columns read as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(HashMap<String, CellValue>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> &CellValue {
        self.0.get(column).unwrap_or(&NULL_CELL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

/// Column names plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build from rows alone; columns are the sorted union of row keys.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns: BTreeSet<&str> = rows.iter().flat_map(Row::columns).collect();
        let columns = columns.into_iter().map(str::to_string).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_refs(&self) -> Vec<&Row> {
        self.rows.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Up to `max` non-missing values of `column`, in row order.
    pub fn sample_values(&self, column: &str, max: usize) -> Vec<&CellValue> {
        self.rows
            .iter()
            .map(|row| row.get(column))
            .filter(|value| !value.is_missing())
            .take(max)
            .collect()
    }

    /// Load a CSV file. Every column is read as text so the pipeline, not the
    /// reader, decides what is numeric.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading CSV: {}", path.display());

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context(format!("Opening {}", path.display()))?
            .finish()
            .context(format!("Parsing {}", path.display()))?;

        let dataset = Self::from_dataframe(&df)?;
        info!(
            "Loaded {} rows x {} columns",
            dataset.len(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Convert a DataFrame. Numeric columns become numbers, everything else
    /// is rendered as text.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows: Vec<HashMap<String, CellValue>> =
            vec![HashMap::with_capacity(columns.len()); df.height()];

        for column in df.get_columns() {
            let name = column.name().to_string();
            let series = column.as_materialized_series();

            let cells: Vec<CellValue> = if is_numeric_dtype(series.dtype()) {
                let floats = series.cast(&DataType::Float64)?;
                floats
                    .f64()?
                    .into_iter()
                    .map(|v| v.map(CellValue::Number).unwrap_or_default())
                    .collect()
            } else {
                let strings = series.cast(&DataType::String)?;
                strings
                    .str()?
                    .into_iter()
                    .map(|v| v.map(CellValue::from).unwrap_or_default())
                    .collect()
            };

            debug!(column = %name, dtype = ?series.dtype(), "Converted column");
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.insert(name.clone(), cell);
            }
        }

        Ok(Self {
            columns,
            rows: rows.into_iter().map(Row).collect(),
        })
    }
}
