use log::debug;

use super::model::{ColumnKind, Table};

/// Column names preferred for stratification, in priority order.
pub const PRIORITY_COLUMNS: [&str; 6] = [
    "protocol_type",
    "protocol-type",
    "protocol",
    "type",
    "class",
    "label",
];

/// Substrings that mark a value as category-like.
const CATEGORY_HINTS: [&str; 7] = ["tcp", "udp", "icmp", "type", "protocol", "category", "class"];

/// Text columns with more distinct values than this are never candidates.
const MAX_CANDIDATE_DISTINCT: usize = 10;

/// Candidates this small are eligible without any hint match.
const SMALL_DISTINCT: usize = 5;

/// Pick a label-like categorical column to stratify on.
///
/// 1. The first of [`PRIORITY_COLUMNS`] present in the table.
/// 2. The text column with the fewest distinct values among those with at
///    most ten, whose first three distinct values contain a category hint
///    or which have at most five distinct values. Ties go to column order.
/// 3. The first text column.
pub fn select_stratify_column(table: &Table) -> Option<String> {
    if let Some(name) = PRIORITY_COLUMNS.iter().find(|name| table.has_column(name)) {
        debug!("stratify column '{name}' matched by name");
        return Some((*name).to_string());
    }

    let text_columns: Vec<usize> = (0..table.column_count())
        .filter(|&idx| table.column_kind(idx) == ColumnKind::Text)
        .collect();

    let mut best: Option<(usize, usize)> = None;
    for &idx in &text_columns {
        let distinct = table.distinct_values(idx);
        if distinct.len() > MAX_CANDIDATE_DISTINCT {
            continue;
        }
        let hinted = distinct.iter().take(3).any(|v| {
            let lower = v.to_string().to_lowercase();
            CATEGORY_HINTS.iter().any(|hint| lower.contains(hint))
        });
        if !hinted && distinct.len() > SMALL_DISTINCT {
            continue;
        }
        if best.map_or(true, |(_, n)| distinct.len() < n) {
            best = Some((idx, distinct.len()));
        }
    }

    let chosen = best.map(|(idx, _)| idx).or_else(|| text_columns.first().copied());
    if let Some(idx) = chosen {
        debug!("stratify column '{}' chosen by value heuristics", table.columns()[idx]);
    }
    chosen.map(|idx| table.columns()[idx].clone())
}
