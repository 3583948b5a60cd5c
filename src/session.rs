//! Record of one ingest-and-split run, persisted as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::model::Table;
use crate::data::split::{SplitConfig, SplitResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSession {
    pub session_key: String,
    pub original_file: String,
    pub upload_time: DateTime<Utc>,

    // Split parameters
    pub test_size: f64,
    pub val_size: f64,
    pub random_state: u64,
    pub stratify_column: Option<String>,
    pub shuffle: bool,

    // Statistics
    pub original_rows: usize,
    pub original_columns: usize,
    pub train_rows: usize,
    pub val_rows: usize,
    pub test_rows: usize,
}

impl DatasetSession {
    pub fn new(
        original_file: impl Into<String>,
        config: &SplitConfig,
        original: &Table,
        split: &SplitResult,
    ) -> Self {
        DatasetSession {
            session_key: format!("{:016x}", rand::random::<u64>()),
            original_file: original_file.into(),
            upload_time: Utc::now(),
            test_size: config.test_size,
            val_size: config.val_fraction_of_holdout,
            random_state: config.random_seed,
            stratify_column: config.stratify_column.clone(),
            shuffle: config.shuffle,
            original_rows: original.len(),
            original_columns: original.column_count(),
            train_rows: split.train.len(),
            val_rows: split.val.len(),
            test_rows: split.test.len(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing session")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing session file {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading session file {}", path.display()))?;
        serde_json::from_str(&text).context("parsing session JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::data::split::split;

    #[test]
    fn session_records_counts_and_round_trips() {
        let rows = (0..20).map(|i| vec![CellValue::Integer(i)]).collect();
        let table = Table::new(vec!["n".into()], rows);
        let config = SplitConfig::default();
        let result = split(&table, &config).unwrap();

        let session = DatasetSession::new("kdd.arff", &config, &table, &result);
        assert_eq!(session.original_rows, 20);
        assert_eq!(session.original_columns, 1);
        assert_eq!((session.train_rows, session.val_rows, session.test_rows), (12, 4, 4));
        assert_eq!(session.session_key.len(), 16);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        session.save(&path).unwrap();
        assert_eq!(DatasetSession::load(&path).unwrap(), session);
    }
}
