use std::{fmt, io::Cursor};

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use encoding_rs::Encoding;
use serde::{Serialize, Serializer};

use crate::{csv_text, output};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Text form used for emptiness checks and rendering. Integral numbers
    /// render without a fractional part.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Trims text cells; numbers and empties pass through.
    pub fn trimmed(&self) -> Cell {
        match self {
            Cell::Text(s) => Cell::Text(s.trim().to_string()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_str(""),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Cell::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < 1e15
}

fn format_number(value: f64) -> String {
    if is_integral(value) {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv,
}

impl SheetFormat {
    /// Guesses the payload format from its leading bytes, falling back to the
    /// hint derived from the URL or file name.
    pub fn sniff(bytes: &[u8], hint: Option<SheetFormat>) -> SheetFormat {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            return SheetFormat::Workbook;
        }
        hint.unwrap_or(SheetFormat::Csv)
    }

    /// Reads the format from an export URL (`format=csv`) or a path extension.
    pub fn from_location(location: &str) -> Option<SheetFormat> {
        let lowered = location.to_ascii_lowercase();
        if lowered.contains("format=csv") || lowered.ends_with(".csv") {
            Some(SheetFormat::Csv)
        } else if lowered.contains("format=xlsx")
            || [".xlsx", ".xls", ".xlsm", ".ods"]
                .iter()
                .any(|ext| lowered.ends_with(ext))
        {
            Some(SheetFormat::Workbook)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Builds a sheet from decoded CSV text; every field becomes a text cell.
    pub fn from_csv_text(text: &str) -> Self {
        let rows = csv_text::parse_rows(text)
            .into_iter()
            .map(|row| row.into_iter().map(Cell::Text).collect())
            .collect();
        Self { rows }
    }

    /// Decodes the first worksheet of a workbook payload.
    ///
    /// Rows keep their absolute column positions: a sheet whose used range
    /// starts at column C still has its first value at index 2. Rows with no
    /// content are skipped and every row is padded to the range width.
    pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes)).context("Opening workbook payload")?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("Workbook does not contain any worksheet"))?
            .context("Reading first worksheet")?;

        let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);
        let width = col_offset + range.width();
        let mut rows = Vec::with_capacity(range.height());
        for source_row in range.rows() {
            let mut row = vec![Cell::Empty; col_offset];
            row.extend(source_row.iter().map(cell_from_data));
            row.resize(width, Cell::Empty);
            if row.iter().all(Cell::is_blank) {
                continue;
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }

    /// Decodes a fetched payload in whichever format it turns out to be.
    pub fn from_payload(
        bytes: Vec<u8>,
        hint: Option<SheetFormat>,
        encoding: &'static Encoding,
    ) -> Result<Self> {
        match SheetFormat::sniff(&bytes, hint) {
            SheetFormat::Workbook => Self::from_workbook_bytes(bytes),
            SheetFormat::Csv => {
                let text = output::decode_text(&bytes, encoding)?;
                Ok(Self::from_csv_text(&text))
            }
        }
    }
}

fn cell_from_data(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => Cell::Text(other.to_string()),
    }
}
