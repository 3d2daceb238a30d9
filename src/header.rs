use std::collections::{HashMap, HashSet};

use crate::sheet::Cell;

pub const HEADER_SCAN_ROWS: usize = 30;

const MERGED_SOURCE_INDEX: usize = 3;
const MERGED_TARGET_INDEX: usize = 4;
const PLACEHOLDER_PREFIX: &str = "Colonne";

/// Returns the index of the row with the most non-blank cells among the first
/// `scan_limit` rows. Ties keep the earliest row; `None` only for an empty sheet.
pub fn select_header_row(rows: &[Vec<Cell>], scan_limit: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in rows.iter().take(scan_limit).enumerate() {
        let score = non_blank_count(row);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

pub fn non_blank_count(row: &[Cell]) -> usize {
    row.iter().filter(|cell| !cell.is_blank()).count()
}

/// Turns the chosen header row into unique, non-empty column names.
pub fn resolve_header(row: &[Cell]) -> Vec<String> {
    let mut names = row
        .iter()
        .map(|cell| cell.as_text().trim().to_string())
        .collect::<Vec<_>>();
    patch_merged_header(&mut names);
    let with_fallback = names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.is_empty() {
                format!("{PLACEHOLDER_PREFIX} {}", idx + 1)
            } else {
                name
            }
        })
        .collect::<Vec<_>>();
    make_unique(&with_fallback)
}

/// A title merged across the fourth and fifth columns leaves the fifth blank.
fn patch_merged_header(names: &mut [String]) {
    if names.len() > MERGED_TARGET_INDEX
        && names[MERGED_TARGET_INDEX].is_empty()
        && !names[MERGED_SOURCE_INDEX].is_empty()
    {
        names[MERGED_TARGET_INDEX] = names[MERGED_SOURCE_INDEX].clone();
    }
}

/// Appends ` (n)` to repeated names, skipping counters whose name is already taken.
pub fn make_unique(names: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(names.len());

    for name in names {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() {
            PLACEHOLDER_PREFIX
        } else {
            trimmed
        };
        let count = seen.entry(base.to_string()).or_insert(0);
        *count += 1;
        let mut candidate = if *count == 1 {
            base.to_string()
        } else {
            format!("{base} ({count})")
        };
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{base} ({count})");
        }
        taken.insert(candidate.clone());
        unique.push(candidate);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn picks_row_with_most_values() {
        let rows = vec![
            row(&["Title", "", "", "", ""]),
            row(&["", "sub", "", "", ""]),
            row(&["#", "Name", "Price", "Stock", "Code"]),
            row(&["1", "Tea", "", "", ""]),
        ];
        assert_eq!(select_header_row(&rows, HEADER_SCAN_ROWS), Some(2));
    }

    #[test]
    fn ties_keep_the_earliest_row() {
        let rows = vec![row(&["a", "b"]), row(&["c", "d"])];
        assert_eq!(select_header_row(&rows, HEADER_SCAN_ROWS), Some(0));
    }

    #[test]
    fn all_blank_rows_select_the_first() {
        let rows = vec![row(&["", " "]), row(&[""])];
        assert_eq!(select_header_row(&rows, HEADER_SCAN_ROWS), Some(0));
    }

    #[test]
    fn rows_beyond_scan_window_are_ignored() {
        let rows = vec![row(&["a"]), row(&["b", "c", "d"])];
        assert_eq!(select_header_row(&rows, 1), Some(0));
        assert_eq!(select_header_row(&[], HEADER_SCAN_ROWS), None);
    }

    #[test]
    fn repeated_names_get_counters() {
        assert_eq!(make_unique(&names(&["A", "A", "B"])), names(&["A", "A (2)", "B"]));
        assert_eq!(
            make_unique(&names(&["A", "A", "A"])),
            names(&["A", "A (2)", "A (3)"])
        );
    }

    #[test]
    fn counters_skip_existing_names() {
        assert_eq!(
            make_unique(&names(&["A (2)", "A", "A"])),
            names(&["A (2)", "A", "A (3)"])
        );
    }

    #[test]
    fn blanks_become_positional_placeholders() {
        let resolved = resolve_header(&row(&["", "Name", ""]));
        assert_eq!(resolved, names(&["Colonne 1", "Name", "Colonne 3"]));
    }

    #[test]
    fn merged_fourth_column_title_is_copied() {
        let resolved = resolve_header(&row(&["#", "Code", "Name", "Price", "", "Stock"]));
        assert_eq!(
            resolved,
            names(&["#", "Code", "Name", "Price", "Price (2)", "Stock"])
        );
    }

    #[test]
    fn numeric_header_cells_are_named_by_their_text() {
        let resolved = resolve_header(&[Cell::Number(2024.0), Cell::from(" Name ")]);
        assert_eq!(resolved, names(&["2024", "Name"]));
    }
}
