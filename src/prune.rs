use crate::table::Table;

/// Drops every column whose values are blank in all records, preserving the
/// order of rows and of the surviving columns. Applying it twice is a no-op.
pub fn prune_empty_columns(table: Table) -> Table {
    let keep = table
        .columns
        .iter()
        .filter(|column| {
            table
                .rows
                .iter()
                .any(|row| row.get(column).is_some_and(|value| !value.is_blank()))
        })
        .cloned()
        .collect::<Vec<_>>();

    if keep.len() == table.columns.len() {
        return table;
    }
    let rows = table.rows.iter().map(|row| row.project(&keep)).collect();
    Table::new(keep, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sheet::Cell, table::Record};

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let columns = columns.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let rows = rows
            .iter()
            .map(|values| {
                Record::new(
                    columns
                        .iter()
                        .cloned()
                        .zip(values.iter().map(|v| Cell::from(*v)))
                        .collect(),
                )
            })
            .collect();
        Table::new(columns, rows)
    }

    #[test]
    fn removes_columns_empty_everywhere() {
        let pruned = prune_empty_columns(table(
            &["a", "b", "c"],
            &[&["1", "", "x"], &["2", " ", ""]],
        ));
        assert_eq!(pruned.columns, vec!["a", "c"]);
        assert_eq!(
            pruned.rows[1].column_names().collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[test]
    fn no_rows_means_no_columns() {
        let pruned = prune_empty_columns(table(&["a", "b"], &[]));
        assert!(pruned.columns.is_empty());
    }

    #[test]
    fn pruning_is_idempotent() {
        let once = prune_empty_columns(table(&["a", "b"], &[&["", "1"], &["", "2"]]));
        let twice = prune_empty_columns(once.clone());
        assert_eq!(once, twice);
    }
}
