use std::{borrow::Cow, fmt::Write as _};

use crate::{cards::Card, ingest::CatalogPage};

pub const NO_DATA_MESSAGE: &str = "No data available.";
const COLUMN_GAP: &str = "  ";

/// Renders `headers` and `rows` as left-aligned columns with a dashed rule
/// under the header. Cells beyond the header width are ignored.
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let headers = headers.iter().map(|h| flatten_cell(h)).collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .take(headers.len())
                .map(|cell| flatten_cell(cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_line(&mut output, headers.iter().map(|c| &**c), &widths);
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    push_line(&mut output, rule.iter().map(String::as_str), &widths);
    for row in &rows {
        push_line(&mut output, row.iter().map(|c| &**c), &widths);
    }
    output
}

fn push_line<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.zip(widths).enumerate() {
        if idx > 0 {
            line.push_str(COLUMN_GAP);
        }
        let _ = write!(line, "{cell:<width$}");
    }
    let _ = writeln!(output, "{}", line.trim_end());
}

/// Replaces line breaks and tabs so one record stays on one line.
fn flatten_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn render_catalog(page: &CatalogPage) -> String {
    if !page.has_data() {
        return format!("{NO_DATA_MESSAGE}\n");
    }
    render_grid(&page.labels, &page.table().text_rows())
}

pub fn card_headers() -> Vec<String> {
    ["title", "subtitle", "description", "discount", "image"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

pub fn card_rows(cards: &[Card]) -> Vec<Vec<String>> {
    cards
        .iter()
        .map(|card| {
            vec![
                card.title.clone(),
                card.subtitle.clone(),
                card.description.clone(),
                card.discount_percent
                    .map(|d| format!("-{d}%"))
                    .unwrap_or_default(),
                card.image_url.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

pub fn render_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return format!("{NO_DATA_MESSAGE}\n");
    }
    render_grid(&card_headers(), &card_rows(cards))
}
