use serde::{Deserialize, Serialize};

use crate::{
    sheet::Cell,
    table::{Record, Table},
};

/// Which header positions become columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnSelection {
    #[default]
    KeepAll,
    /// Skip the first `n` positions, e.g. an internal row-number column.
    DropLeading(usize),
}

impl ColumnSelection {
    pub fn indices(&self, width: usize) -> Vec<usize> {
        match self {
            ColumnSelection::KeepAll => (0..width).collect(),
            ColumnSelection::DropLeading(n) => (*n..width).collect(),
        }
    }
}

/// Builds records for `body` using the selected header positions.
///
/// Text values are trimmed, short rows read missing cells as empty, and
/// records with no non-blank value are dropped.
pub fn map_rows(header: &[String], body: &[Vec<Cell>], selection: ColumnSelection) -> Table {
    let indices = selection.indices(header.len());
    let columns = indices
        .iter()
        .map(|&idx| header[idx].clone())
        .collect::<Vec<_>>();

    let rows = body
        .iter()
        .map(|row| {
            let fields = indices
                .iter()
                .zip(&columns)
                .map(|(&idx, name)| {
                    let value = row.get(idx).map(Cell::trimmed).unwrap_or_default();
                    (name.clone(), value)
                })
                .collect();
            Record::new(fields)
        })
        .filter(|record| !record.is_blank())
        .collect();

    Table::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn row(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    #[test]
    fn trims_text_and_keeps_numbers() {
        let body = vec![vec![Cell::from("  Tea "), Cell::Number(3.5)]];
        let table = map_rows(&header(&["Name", "Price"]), &body, ColumnSelection::KeepAll);
        assert_eq!(table.rows[0].get("Name"), Some(&Cell::from("Tea")));
        assert_eq!(table.rows[0].get("Price"), Some(&Cell::Number(3.5)));
    }

    #[test]
    fn drops_blank_records_and_pads_short_rows() {
        let body = vec![row(&["", "  "]), row(&["Tea"]), vec![]];
        let table = map_rows(&header(&["Name", "Price"]), &body, ColumnSelection::KeepAll);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("Price"), Some(&Cell::Empty));
    }

    #[test]
    fn leading_columns_can_be_dropped_by_position() {
        let body = vec![row(&["1", "Tea", "10"]), row(&["2", "", ""])];
        let table = map_rows(
            &header(&["#", "Name", "Price"]),
            &body,
            ColumnSelection::DropLeading(1),
        );
        assert_eq!(table.columns, header(&["Name", "Price"]));
        // the second row only had a value in the dropped column
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].text("Price"), "10");
    }

    #[test]
    fn dropping_more_than_width_yields_no_columns() {
        let table = map_rows(&header(&["a"]), &[row(&["x"])], ColumnSelection::DropLeading(3));
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
    }
}
