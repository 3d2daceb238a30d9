use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::sheet::Cell;

/// One retained data row: column name to trimmed value, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Cell)>,
}

impl Record {
    pub fn new(fields: Vec<(String, Cell)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Value of `column` as text; missing columns read as empty.
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(Cell::as_text).unwrap_or_default()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_blank())
    }

    /// Keeps only `columns`, in that order. Columns the record lacks become empty.
    pub fn project(&self, columns: &[String]) -> Record {
        let fields = columns
            .iter()
            .map(|name| (name.clone(), self.get(name).cloned().unwrap_or_default()))
            .collect();
        Record { fields }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Column keys plus the records that use them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Row values as text in column order, for rendering and CSV export.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().map(|col| row.text(col)).collect())
            .collect()
    }
}
