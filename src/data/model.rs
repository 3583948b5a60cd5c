use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a parsed table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Strata are grouped in ordered maps downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeMap / HashSet --
// Floats compare with `total_cmp` and hash by bits, so NaN equals itself.

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text used when the value is written to a flat file; null becomes empty.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Approximate heap + inline footprint, used for memory summaries.
    pub fn approx_size(&self) -> usize {
        let inline = std::mem::size_of::<CellValue>();
        match self {
            CellValue::Text(s) => inline + s.capacity(),
            _ => inline,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – inferred column type
// ---------------------------------------------------------------------------

/// Column type inferred from the values actually present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every non-null cell is an integer or a float.
    Numeric,
    /// At least one non-null cell is text.
    Text,
    /// No non-null cells at all.
    Empty,
}

// ---------------------------------------------------------------------------
// Table – the complete parsed dataset
// ---------------------------------------------------------------------------

/// Ordered named columns plus rows aligned to them.
///
/// Column names may repeat; lookups by name resolve to the first occurrence
/// and positional accessors reach the others.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// `@relation` name, when the source declared one.
    pub relation: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table, padding short rows with null and truncating long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        Table {
            relation: None,
            columns,
            rows,
        }
    }

    pub fn with_relation(mut self, relation: Option<String>) -> Self {
        self.relation = relation;
        self
    }

    /// Copy the given rows (by index, in the given order) into a new table
    /// sharing this table's columns.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            relation: self.relation.clone(),
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate the cells of the column at `idx`.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Distinct values of a column in order of first appearance.
    pub fn distinct_values(&self, idx: usize) -> Vec<&CellValue> {
        let mut seen = HashSet::new();
        self.column_values(idx)
            .filter(|v| seen.insert(*v))
            .collect()
    }

    pub fn distinct_count(&self, idx: usize) -> usize {
        self.column_values(idx).collect::<HashSet<_>>().len()
    }

    /// Occurrences of each distinct value of a column.
    pub fn value_counts(&self, idx: usize) -> HashMap<&CellValue, usize> {
        let mut counts = HashMap::new();
        for v in self.column_values(idx) {
            *counts.entry(v).or_insert(0) += 1;
        }
        counts
    }

    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for v in self.column_values(idx) {
            match v {
                CellValue::Null => {}
                CellValue::Text(_) => return ColumnKind::Text,
                CellValue::Integer(_) | CellValue::Float(_) => kind = ColumnKind::Numeric,
            }
        }
        kind
    }

    /// Column names with repeats disambiguated by position: the second
    /// `a` becomes `a_1`, the third `a_2`, skipping names already in use.
    pub fn unique_column_names(&self) -> Vec<String> {
        let mut used: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let mut candidate = name.clone();
            let mut n = 1;
            while !used.insert(candidate.clone()) {
                candidate = format!("{name}_{n}");
                n += 1;
            }
            out.push(candidate);
        }
        out
    }

    /// Approximate in-memory size of the table in bytes.
    pub fn approx_size(&self) -> usize {
        let names: usize = self.columns.iter().map(|c| c.capacity()).sum();
        let cells: usize = self
            .rows
            .iter()
            .flat_map(|row| row.iter())
            .map(CellValue::approx_size)
            .sum();
        names + cells
    }

    /// Overwrite column `idx` with `values`, one per row.
    pub(crate) fn replace_column(&mut self, idx: usize, values: Vec<CellValue>) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
    }
}
