use log::{debug, warn};

use super::model::{CellValue, Table};
use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Recovery statistics
// ---------------------------------------------------------------------------

/// Counts of the recoveries applied while parsing.
///
/// Malformed lines never abort a parse; they are repaired and counted here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Rows with fewer tokens than columns, padded with null.
    pub padded_rows: usize,
    /// Rows with more tokens than columns, extra tokens dropped.
    pub truncated_rows: usize,
    /// Lines in the data section that could not be rows (stray `@` lines,
    /// lines left empty after stripping an inline comment).
    pub skipped_lines: usize,
    /// Column names declared more than once.
    pub duplicate_columns: usize,
    /// Column names synthesized because no `@attribute` was declared.
    pub synthesized_columns: bool,
    /// The input was not valid UTF-8 and was read as Latin-1.
    pub latin1_fallback: bool,
    /// No `@data` marker was found; rows started at the first raw line.
    pub missing_data_marker: bool,
}

/// A parsed table together with what the parser had to repair.
#[derive(Debug, Clone)]
pub struct ParsedArff {
    pub table: Table,
    pub stats: ParseStats,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse raw ARFF bytes into a [`Table`].
pub fn parse_arff(bytes: &[u8]) -> Result<Table, ParseError> {
    parse_arff_with_stats(bytes).map(|parsed| parsed.table)
}

/// Parse raw ARFF bytes, also reporting the recoveries applied.
pub fn parse_arff_with_stats(bytes: &[u8]) -> Result<ParsedArff, ParseError> {
    let mut stats = ParseStats::default();
    let text = decode(bytes, &mut stats);

    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let header = scan_header(&lines, &mut stats);
    let mut columns = header.columns;
    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    let data_lines = header.data_start.map_or(&[][..], |start| &lines[start..]);
    for &line in data_lines {
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if line.starts_with('@') {
            // Without a marker, declarations may sit between rows; the header
            // scan already collected them.
            let declaration =
                starts_with_keyword(line, "@attribute") || starts_with_keyword(line, "@relation");
            if !(stats.missing_data_marker && declaration) {
                stats.skipped_lines += 1;
            }
            continue;
        }

        let content = strip_inline_comment(line);
        if content.is_empty() {
            stats.skipped_lines += 1;
            continue;
        }

        let tokens: Vec<&str> = content.split(',').collect();
        if columns.is_empty() {
            columns = (0..tokens.len()).map(|i| format!("col_{i}")).collect();
            stats.synthesized_columns = true;
        }

        let width = columns.len();
        let mut row: Vec<CellValue> = tokens.iter().take(width).map(|t| parse_token(t)).collect();
        if tokens.len() > width {
            stats.truncated_rows += 1;
        } else if tokens.len() < width {
            stats.padded_rows += 1;
            row.resize(width, CellValue::Null);
        }
        rows.push(row);
    }

    if rows.is_empty() {
        let cause = if text.trim().is_empty() {
            "input is empty"
        } else if header.data_start.is_some() && !stats.missing_data_marker {
            "@data section contains no rows"
        } else {
            "no @data section and no raw data lines found"
        };
        return Err(ParseError::no_data_rows(cause));
    }

    if stats.padded_rows + stats.truncated_rows + stats.skipped_lines > 0 {
        warn!(
            "recovered malformed input: {} padded, {} truncated, {} skipped",
            stats.padded_rows, stats.truncated_rows, stats.skipped_lines
        );
    }
    debug!("parsed {} rows x {} columns", rows.len(), columns.len());

    Ok(ParsedArff {
        table: Table::new(columns, rows).with_relation(header.relation),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Declarations found before the rows are read.
struct Header {
    relation: Option<String>,
    columns: Vec<String>,
    /// Index of the first line that may hold a row.
    data_start: Option<usize>,
}

/// Collect `@relation` and `@attribute` declarations up to `@data`.
///
/// Without a `@data` marker every declaration in the file counts, wherever it
/// appears, and rows start at the first raw line.
fn scan_header(lines: &[&str], stats: &mut ParseStats) -> Header {
    let mut relation = None;
    let mut columns: Vec<String> = Vec::new();
    let mut marker = None;
    let mut first_raw = None;
    let mut raw_before_marker = 0;

    for (i, &line) in lines.iter().enumerate() {
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        if starts_with_keyword(line, "@data") {
            marker = Some(i + 1);
            break;
        }
        if starts_with_keyword(line, "@attribute") {
            if let Some(name) = attribute_name(line) {
                if columns.contains(&name) {
                    warn!("duplicate attribute name '{name}'");
                    stats.duplicate_columns += 1;
                }
                columns.push(name);
            }
        } else if starts_with_keyword(line, "@relation") {
            relation = attribute_name(line);
        } else if !line.starts_with('@') {
            first_raw.get_or_insert(i);
            raw_before_marker += 1;
        }
        // Other header directives (@end, @comment, ...) carry no data.
    }

    let data_start = match marker {
        Some(start) => {
            // Raw lines ahead of @data are not rows.
            stats.skipped_lines += raw_before_marker;
            Some(start)
        }
        None => {
            if first_raw.is_some() {
                debug!("no @data marker, treating raw lines as data");
                stats.missing_data_marker = true;
            }
            first_raw
        }
    };

    Header {
        relation,
        columns,
        data_start,
    }
}

/// UTF-8 first, Latin-1 otherwise. Latin-1 maps every byte to the code point
/// of the same value, so the fallback cannot fail.
fn decode(bytes: &[u8], stats: &mut ParseStats) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) => {
            debug!("input is not UTF-8 ({e}), decoding as Latin-1");
            stats.latin1_fallback = true;
            bytes.iter().map(|&b| b as char).collect()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Case-insensitive keyword match that requires a word boundary after it.
fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    let Some(head) = line.get(..keyword.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(keyword)
        && line[keyword.len()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// Name following a header keyword. A quoted name may contain spaces;
/// surrounding quotes are stripped either way.
fn attribute_name(line: &str) -> Option<String> {
    let rest = line.split_once(char::is_whitespace)?.1.trim_start();
    let first = rest.chars().next()?;
    let name = if first == '\'' || first == '"' {
        match rest[1..].find(first) {
            Some(end) => &rest[1..end + 1],
            None => rest.split_whitespace().next()?,
        }
    } else {
        rest.split_whitespace().next()?
    };
    let name = strip_quotes(name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find('%') {
        Some(pos) => line[..pos].trim(),
        None => line,
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == '"')
}

/// Trim, unquote and attempt numeric conversion of a single data token.
fn parse_token(raw: &str) -> CellValue {
    let token = strip_quotes(raw.trim());
    if token == "?" {
        return CellValue::Null;
    }
    if token.contains('.') {
        if let Ok(f) = token.parse::<f64>() {
            return CellValue::Float(f);
        }
    } else if let Ok(i) = token.parse::<i64>() {
        return CellValue::Integer(i);
    }
    CellValue::Text(token.to_string())
}
