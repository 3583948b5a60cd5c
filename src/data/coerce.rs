use log::debug;

use super::model::{CellValue, Table};

/// Column-wide numeric normalization.
///
/// A column is converted only when every cell converts: numbers stay
/// numbers, null stays null, and text must parse as an integer or a float.
/// Columns holding any float after conversion are widened to all-float.
/// Columns that fail are left exactly as parsed.
pub fn coerce(mut table: Table) -> Table {
    for idx in 0..table.column_count() {
        if let Some(values) = coerce_column(&table, idx) {
            debug!("coerced column '{}' to numeric", table.columns()[idx]);
            table.replace_column(idx, values);
        }
    }
    table
}

fn coerce_column(table: &Table, idx: usize) -> Option<Vec<CellValue>> {
    let mut any_text = false;
    let mut any_float = false;
    let mut values = Vec::with_capacity(table.len());

    for cell in table.column_values(idx) {
        let value = match cell {
            CellValue::Text(s) => {
                any_text = true;
                to_number(s)?
            }
            other => other.clone(),
        };
        any_float |= matches!(value, CellValue::Float(_));
        values.push(value);
    }

    if any_float {
        for v in &mut values {
            if let CellValue::Integer(i) = *v {
                *v = CellValue::Float(i as f64);
            }
        }
    } else if !any_text {
        // Already all-integer (or null); nothing to replace.
        return None;
    }
    Some(values)
}

fn to_number(s: &str) -> Option<CellValue> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(CellValue::Integer(i));
    }
    s.parse::<f64>().ok().map(CellValue::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn converts_fully_numeric_text_columns() {
        let table = Table::new(
            vec!["n".into()],
            vec![vec![text("1e3")], vec![CellValue::Integer(2)], vec![CellValue::Null]],
        );
        let table = coerce(table);
        let col: Vec<_> = table.column_values(0).cloned().collect();
        assert_eq!(col, vec![CellValue::Float(1000.0), CellValue::Float(2.0), CellValue::Null]);
    }

    #[test]
    fn mixed_columns_are_left_as_parsed() {
        let rows = vec![vec![text("tcp")], vec![CellValue::Integer(3)]];
        let table = Table::new(vec!["p".into()], rows.clone());
        let coerced = coerce(table);
        assert_eq!(coerced.rows(), rows.as_slice());
    }

    #[test]
    fn int_and_float_columns_are_widened() {
        let table = Table::new(
            vec!["x".into(), "y".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Integer(5)],
                vec![CellValue::Float(2.5), CellValue::Integer(6)],
            ],
        );
        let table = coerce(table);
        assert_eq!(table.rows()[0], vec![CellValue::Float(1.0), CellValue::Integer(5)]);
        assert_eq!(table.rows()[1], vec![CellValue::Float(2.5), CellValue::Integer(6)]);
    }
}
