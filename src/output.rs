use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// CSV with display labels as the header row
    Csv,
    /// Pretty-printed JSON
    Json,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => Encoding::for_label(value.as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

/// Decodes `bytes`, stripping a BOM that matches `encoding`. Malformed input is an error.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    Ok(writer)
}

/// Writes a header row and data rows as fully quoted CSV.
pub fn write_csv<W: Write>(writer: W, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .flexible(false);
    let mut csv_writer = builder.from_writer(writer);
    csv_writer
        .write_record(headers)
        .context("Writing CSV header")?;
    for (idx, row) in rows.iter().enumerate() {
        csv_writer
            .write_record(row)
            .with_context(|| format!("Writing CSV row {}", idx + 1))?;
    }
    csv_writer.flush().context("Flushing CSV output")?;
    Ok(())
}

pub fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("Writing JSON output")?;
    writeln!(writer).context("Writing JSON output")?;
    writer.flush().context("Flushing JSON output")?;
    Ok(())
}
