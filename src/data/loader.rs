use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use super::arff::{parse_arff_with_stats, ParsedArff};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.arff` – Weka Attribute-Relation File Format
pub fn load_file(path: &Path) -> Result<ParsedArff> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "arff" => load_arff(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn load_arff(path: &Path) -> Result<ParsedArff> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading ARFF file {}", path.display()))?;
    let parsed = parse_arff_with_stats(&bytes)
        .with_context(|| format!("Error loading ARFF file {}", path.display()))?;
    info!(
        "loaded {} rows x {} columns from {}",
        parsed.table.len(),
        parsed.table.column_count(),
        path.display()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_arff_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".ARFF").tempfile().unwrap();
        writeln!(file, "@attribute a numeric\n@data\n1\n2").unwrap();
        let parsed = load_file(file.path()).unwrap();
        assert_eq!(parsed.table.len(), 2);
    }

    #[test]
    fn rejects_other_extensions() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn parse_failure_keeps_cause() {
        let mut file = tempfile::Builder::new().suffix(".arff").tempfile().unwrap();
        writeln!(file, "% empty").unwrap();
        let err = load_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("no data rows parsed"));
    }
}
