//! Monospace tablature rows.

use crate::model::{TabStaff, STRING_COUNT};

/// String names in print order, high e first.
const STRING_NAMES: [&str; STRING_COUNT] = ["e", "B", "G", "D", "A", "E"];

/// Render a staff as six rows like `e|--0--2--|`. All rows have the same
/// width; rests are left as dashes.
pub fn tab_rows(staff: &TabStaff) -> Vec<String> {
    let body = staff
        .strings()
        .iter()
        .flatten()
        .map(|m| m.column + m.fret.map_or(1, |f| f.to_string().len()))
        .max()
        .unwrap_or(0)
        + 2;

    staff
        .strings()
        .iter()
        .zip(STRING_NAMES)
        .map(|(marks, name)| {
            let mut cells = vec!['-'; body];
            for mark in marks {
                if let Some(fret) = mark.fret {
                    for (i, c) in fret.to_string().chars().enumerate() {
                        cells[mark.column + 1 + i] = c;
                    }
                }
            }
            format!("{name}|{}|", cells.into_iter().collect::<String>())
        })
        .collect()
}
