//! Write split subsets to disk as CSV, JSON records or Parquet.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::ValueEnum;
use log::info;
use parquet::arrow::ArrowWriter;
use serde_json::{Map, Value as JsonValue};

use crate::data::model::{CellValue, ColumnKind, Table};
use crate::data::split::SplitResult;
use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// Write `train.*`, `val.*` and `test.*` into `dir`, creating it if needed.
/// Returns the written paths in that order.
pub fn write_split(
    split: &SplitResult,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(3);
    for (name, table) in [("train", &split.train), ("val", &split.val), ("test", &split.test)] {
        let path = dir.join(format!("{name}.{}", format.extension()));
        write_table(table, &path, format)?;
        info!("wrote {} rows to {}", table.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn write_table(table: &Table, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => write_csv(table, path),
        ExportFormat::Json => write_json(table, path),
        ExportFormat::Parquet => write_parquet(table, path),
    }
}

// ---------------------------------------------------------------------------
// CSV / JSON
// ---------------------------------------------------------------------------

fn write_csv(table: &Table, path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.unique_column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(CellValue::to_field))?;
    }
    writer.flush()?;
    Ok(())
}

/// Records-oriented JSON: `[{"col": value, ...}, ...]`.
fn write_json(table: &Table, path: &Path) -> Result<(), ExportError> {
    let names = table.unique_column_names();
    let mut records = Vec::with_capacity(table.len());
    for row in table.rows() {
        let mut record: Map<String, JsonValue> = Map::new();
        for (name, cell) in names.iter().zip(row) {
            record.insert(name.clone(), serde_json::to_value(cell)?);
        }
        records.push(record);
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn write_parquet(table: &Table, path: &Path) -> Result<(), ExportError> {
    let batch = to_record_batch(table)?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Integer-only columns become Int64, other numeric columns Float64, and
/// everything else Utf8 (numbers in mixed columns are written as text).
fn to_record_batch(table: &Table) -> Result<RecordBatch, ExportError> {
    let mut fields = Vec::with_capacity(table.column_count());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_count());

    for (idx, name) in table.unique_column_names().into_iter().enumerate() {
        let all_int = table
            .column_values(idx)
            .all(|v| matches!(v, CellValue::Integer(_) | CellValue::Null));
        let (data_type, array): (DataType, ArrayRef) = match table.column_kind(idx) {
            ColumnKind::Numeric if all_int => {
                let values: Vec<Option<i64>> = table
                    .column_values(idx)
                    .map(|v| match v {
                        CellValue::Integer(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                (DataType::Int64, Arc::new(Int64Array::from(values)))
            }
            ColumnKind::Numeric => {
                let values: Vec<Option<f64>> = table.column_values(idx).map(CellValue::as_f64).collect();
                (DataType::Float64, Arc::new(Float64Array::from(values)))
            }
            ColumnKind::Text | ColumnKind::Empty => {
                let values: Vec<Option<String>> = table
                    .column_values(idx)
                    .map(|v| (!v.is_null()).then(|| v.to_string()))
                    .collect();
                (DataType::Utf8, Arc::new(StringArray::from(values)))
            }
        };
        fields.push(Field::new(name, data_type, true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
