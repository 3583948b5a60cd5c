//! ARFF ingestion and stratified train/validation/test splitting.
//!
//! ```no_run
//! use arff_split::{coerce, parse_arff, select_stratify_column, split, SplitConfig};
//!
//! let bytes = std::fs::read("kdd.arff")?;
//! let table = coerce(parse_arff(&bytes)?);
//! let config = SplitConfig {
//!     stratify_column: select_stratify_column(&table),
//!     ..SplitConfig::default()
//! };
//! let subsets = split(&table, &config)?;
//! println!("{} / {} / {}", subsets.train.len(), subsets.val.len(), subsets.test.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod data;
pub mod error;
pub mod export;
pub mod report;
pub mod session;

pub use data::arff::{parse_arff, parse_arff_with_stats, ParseStats, ParsedArff};
pub use data::coerce::coerce;
pub use data::model::{CellValue, ColumnKind, Table};
pub use data::split::{split, SplitConfig, SplitIndices, SplitResult, Stratification, StratifyPolicy};
pub use data::stratify::select_stratify_column;
pub use error::{ExportError, ParseError, SplitError};
