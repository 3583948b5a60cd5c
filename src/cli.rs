use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use arff_split::data::loader::load_file;
use arff_split::export::{write_split, ExportFormat};
use arff_split::report::chart::{bar_chart, placeholder, DEFAULT_BAR_WIDTH};
use arff_split::report::summary::{DatasetInfo, SplitReport};
use arff_split::session::DatasetSession;
use arff_split::{coerce, select_stratify_column, split, SplitConfig, StratifyPolicy};

/// Parse an ARFF dataset and split it into train / validation / test subsets.
#[derive(Parser, Debug)]
#[command(name = "arff-split", version, about)]
pub struct Cli {
    /// ARFF file to ingest.
    pub input: PathBuf,

    /// Fraction of rows held out of training.
    #[arg(long, default_value_t = 0.4)]
    pub test_size: f64,

    /// Fraction of the holdout used for validation; the rest is test.
    #[arg(long, default_value_t = 0.5)]
    pub val_size: f64,

    /// Seed for the sampling generator.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Keep file order instead of shuffling.
    #[arg(long)]
    pub no_shuffle: bool,

    /// Column to stratify on (chosen automatically when omitted).
    #[arg(long, conflicts_with = "no_stratify")]
    pub stratify: Option<String>,

    /// Split without stratification.
    #[arg(long)]
    pub no_stratify: bool,

    /// Fail instead of falling back when stratification is impossible.
    #[arg(long)]
    pub strict_stratify: bool,

    /// Skip the column-wide numeric coercion pass.
    #[arg(long)]
    pub no_coerce: bool,

    /// Directory to write train/val/test files into.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Format of the written subsets.
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Write the full report as JSON to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a session record as JSON to this file.
    #[arg(long)]
    pub session: Option<PathBuf>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let parsed = load_file(&self.input)?;
        let stats = &parsed.stats;
        if stats.padded_rows + stats.truncated_rows > 0 {
            info!(
                "{} rows padded, {} rows truncated to {} columns",
                stats.padded_rows,
                stats.truncated_rows,
                parsed.table.column_count()
            );
        }

        let table = if self.no_coerce {
            parsed.table
        } else {
            coerce(parsed.table)
        };

        let stratify_column = if self.no_stratify {
            None
        } else {
            self.stratify.clone().or_else(|| select_stratify_column(&table))
        };
        info!("stratify column: {}", stratify_column.as_deref().unwrap_or("<none>"));

        let config = SplitConfig {
            test_size: self.test_size,
            val_fraction_of_holdout: self.val_size,
            random_seed: self.seed,
            shuffle: !self.no_shuffle,
            stratify_column,
            policy: if self.strict_stratify {
                StratifyPolicy::Strict
            } else {
                StratifyPolicy::Degrade
            },
        };
        let result = split(&table, &config)?;
        let report = SplitReport::new(&table, &result, &config);

        print_report(&report);

        if let Some(dir) = &self.out_dir {
            let paths = write_split(&result, dir, self.format)
                .with_context(|| format!("exporting subsets to {}", dir.display()))?;
            for path in paths {
                println!("wrote {}", path.display());
            }
        }

        if let Some(path) = &self.report {
            let json = serde_json::to_string_pretty(&report).context("serializing report")?;
            std::fs::write(path, json)
                .with_context(|| format!("writing report {}", path.display()))?;
        }

        if let Some(path) = &self.session {
            let file_name = self
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            DatasetSession::new(file_name, &config, &table, &result).save(path)?;
        }

        Ok(())
    }
}

fn print_report(report: &SplitReport) {
    print_info("Original", &report.original);
    println!(
        "Split: {} train / {} val / {} test ({:?})",
        report.train.rows, report.val.rows, report.test.rows, report.stratification
    );
    println!();

    let titles = ["Full dataset", "Training set", "Validation set", "Test set"];
    match (&report.stratify_column, &report.distributions) {
        (Some(column), Some(dists)) => {
            let subsets = [&dists.original, &dists.train, &dists.val, &dists.test];
            for (title, counts) in titles.iter().zip(subsets) {
                print!("{}", bar_chart(&format!("{title} - {column}"), counts, DEFAULT_BAR_WIDTH));
            }
        }
        _ => {
            for title in titles {
                print!("{}", placeholder(title));
            }
        }
    }
}

fn print_info(label: &str, info: &DatasetInfo) {
    println!(
        "{label}: {} rows x {} columns ({})",
        info.rows, info.columns, info.memory_usage
    );
    println!(
        "  numeric: {}  categorical: {}",
        info.numeric_columns.len(),
        info.categorical_columns.len()
    );
}
