use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{CellValue, ColumnKind, Table};
use crate::data::split::{SplitConfig, SplitResult, Stratification};

// ---------------------------------------------------------------------------
// DatasetInfo – per-table statistics
// ---------------------------------------------------------------------------

/// Rows shown in [`DatasetInfo::sample_data`].
const SAMPLE_ROWS: usize = 3;

/// Shape, size and column typing of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: usize,
    pub memory_bytes: usize,
    /// `memory_bytes` formatted as megabytes, e.g. `"0.3 MB"`.
    pub memory_usage: String,
    pub categorical_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub column_names: Vec<String>,
    /// First rows keyed by (disambiguated) column name; null renders empty.
    pub sample_data: Vec<BTreeMap<String, String>>,
}

impl DatasetInfo {
    pub fn from_table(table: &Table) -> Self {
        let mut categorical_columns = Vec::new();
        let mut numeric_columns = Vec::new();
        for (idx, name) in table.columns().iter().enumerate() {
            match table.column_kind(idx) {
                ColumnKind::Numeric => numeric_columns.push(name.clone()),
                ColumnKind::Text | ColumnKind::Empty => categorical_columns.push(name.clone()),
            }
        }

        let names = table.unique_column_names();
        let sample_data = table
            .rows()
            .iter()
            .take(SAMPLE_ROWS)
            .map(|row| {
                names
                    .iter()
                    .cloned()
                    .zip(row.iter().map(CellValue::to_field))
                    .collect()
            })
            .collect();

        let memory_bytes = table.approx_size();
        DatasetInfo {
            rows: table.len(),
            columns: table.column_count(),
            memory_bytes,
            memory_usage: format!("{:.1} MB", memory_bytes as f64 / 1024.0 / 1024.0),
            categorical_columns,
            numeric_columns,
            column_names: table.columns().to_vec(),
            sample_data,
        }
    }
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

/// Occurrences of one value in a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: CellValue,
    pub count: usize,
}

/// Value counts of `column`, most frequent first (ties in value order).
/// Empty when the column does not exist.
pub fn column_distribution(table: &Table, column: &str) -> Vec<ValueCount> {
    let Some(idx) = table.column_index(column) else {
        return Vec::new();
    };
    let mut counts: Vec<ValueCount> = table
        .value_counts(idx)
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.clone(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

// ---------------------------------------------------------------------------
// SplitReport – everything the caller shows after a split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsetDistributions {
    pub original: Vec<ValueCount>,
    pub train: Vec<ValueCount>,
    pub val: Vec<ValueCount>,
    pub test: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitReport {
    /// Parameters the split ran with.
    pub config: SplitConfig,
    pub original: DatasetInfo,
    pub train: DatasetInfo,
    pub val: DatasetInfo,
    pub test: DatasetInfo,
    pub stratify_column: Option<String>,
    pub stratification: Stratification,
    /// Present when the stratify column exists in the table.
    pub distributions: Option<SubsetDistributions>,
}

impl SplitReport {
    pub fn new(original: &Table, split: &SplitResult, config: &SplitConfig) -> Self {
        let stratify_column = config.stratify_column.as_deref();
        let distributions = stratify_column
            .filter(|col| original.has_column(col))
            .map(|col| SubsetDistributions {
                original: column_distribution(original, col),
                train: column_distribution(&split.train, col),
                val: column_distribution(&split.val, col),
                test: column_distribution(&split.test, col),
            });

        SplitReport {
            config: config.clone(),
            original: DatasetInfo::from_table(original),
            train: DatasetInfo::from_table(&split.train),
            val: DatasetInfo::from_table(&split.val),
            test: DatasetInfo::from_table(&split.test),
            stratify_column: stratify_column.map(str::to_string),
            stratification: split.stratification,
            distributions,
        }
    }
}
