use std::fmt::Write;

use super::summary::ValueCount;

/// Width in characters of the longest bar.
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Values listed before the rest are folded into an "(other)" line.
const MAX_BARS: usize = 20;

const NO_COLUMN_MESSAGE: &str = "No categorical column found for visualization";

// ---------------------------------------------------------------------------
// Text bar chart of a value distribution
// ---------------------------------------------------------------------------

/// Render a horizontal bar chart of `counts` under `title`.
///
/// ```text
/// Training set - protocol_type
///   tcp  | ######################################## 36
///   udp  | ########################### 24
/// ```
pub fn bar_chart(title: &str, counts: &[ValueCount], width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    if counts.is_empty() {
        let _ = writeln!(out, "  (no rows)");
        return out;
    }

    let mut entries: Vec<(String, usize)> = counts
        .iter()
        .take(MAX_BARS)
        .map(|vc| (vc.value.to_string(), vc.count))
        .collect();
    if counts.len() > MAX_BARS {
        let rest: usize = counts[MAX_BARS..].iter().map(|vc| vc.count).sum();
        entries.push((format!("({} other)", counts.len() - MAX_BARS), rest));
    }

    let max = entries.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
    let label_width = entries.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (label, count) in &entries {
        let len = (count * width + max - 1) / max;
        let _ = writeln!(out, "  {label:<label_width$} | {} {count}", "#".repeat(len));
    }
    out
}

/// Stand-in for a chart when there is no categorical column to plot.
pub fn placeholder(title: &str) -> String {
    format!("{title}\n  {NO_COLUMN_MESSAGE}\n")
}
