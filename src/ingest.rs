//! Price list ingestion: header, mapping, pruning and labels.

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    fetch::{CachePolicy, Fetcher, Source},
    header::{self, HEADER_SCAN_ROWS},
    labels,
    mapper::{self, ColumnSelection},
    prune,
    sheet::Sheet,
    table::{Record, Table},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CatalogPage {
    pub columns: Vec<String>,
    pub labels: Vec<String>,
    pub rows: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl CatalogPage {
    pub fn empty(download_url: Option<String>) -> Self {
        Self {
            download_url,
            ..Self::default()
        }
    }

    pub fn has_data(&self) -> bool {
        !self.columns.is_empty() && !self.rows.is_empty()
    }

    pub fn table(&self) -> Table {
        Table::new(self.columns.clone(), self.rows.clone())
    }
}

/// Runs header detection, mapping, pruning and labelling over a sheet.
pub fn normalize_sheet(sheet: &Sheet, selection: ColumnSelection) -> CatalogPage {
    let Some(header_index) = header::select_header_row(&sheet.rows, HEADER_SCAN_ROWS) else {
        return CatalogPage::default();
    };
    debug!("Using row {} as header", header_index + 1);
    let header = header::resolve_header(&sheet.rows[header_index]);
    let mapped = mapper::map_rows(&header, &sheet.rows[header_index + 1..], selection);
    let table = prune::prune_empty_columns(mapped);
    let labels = labels::derive_labels(&table);
    CatalogPage {
        columns: table.columns,
        labels,
        rows: table.rows,
        download_url: None,
    }
}

fn try_load_catalog(
    fetcher: &Fetcher,
    source: Option<&Source>,
    selection: ColumnSelection,
    encoding: &'static Encoding,
) -> Result<CatalogPage> {
    let source = source.ok_or_else(|| anyhow!("No price list source configured"))?;
    let payload = fetcher
        .load(source, CachePolicy::NoStore)
        .with_context(|| format!("Fetching price list from {source}"))?;
    let sheet = Sheet::from_payload(payload, source.format_hint(), encoding)
        .with_context(|| format!("Decoding price list from {source}"))?;
    Ok(normalize_sheet(&sheet, selection))
}

/// Fetches and normalizes the price list. Failures are logged and yield an empty page.
pub fn load_catalog(
    fetcher: &Fetcher,
    source: Option<&Source>,
    selection: ColumnSelection,
    encoding: &'static Encoding,
) -> CatalogPage {
    let download_url = match source {
        Some(Source::Url(url)) => Some(url.clone()),
        _ => None,
    };
    match try_load_catalog(fetcher, source, selection, encoding) {
        Ok(mut page) => {
            info!(
                "Catalog has {} column(s) and {} row(s)",
                page.columns.len(),
                page.rows.len()
            );
            page.download_url = download_url;
            page
        }
        Err(err) => {
            warn!("Price list unavailable: {err:#}");
            CatalogPage::empty(download_url)
        }
    }
}
