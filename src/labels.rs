//! Display labels for catalog columns.
//!
//! Column keys carry ` (n)` counters to stay unique; labels drop them. Some
//! price lists also repeat one merged header over several columns, which is
//! repaired through the fixed [`SENTINEL_RULES`] table.

use std::sync::OnceLock;

use regex::Regex;

use crate::table::Table;

pub struct SentinelRule {
    /// Header text that appears twice in a row when the sheet is affected.
    pub sentinel: &'static str,
    /// Labels for the columns after the first sentinel, in order.
    pub relabels: &'static [&'static str],
    /// Label for the next column when its values look like barcodes.
    pub barcode: &'static str,
}

pub const SENTINEL_RULES: &[SentinelRule] = &[SentinelRule {
    sentinel: "Номенклатура",
    relabels: &["Цена", "Остаток"],
    barcode: "Штрихкод",
}];

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r" \(\d+\)$").expect("valid suffix pattern"))
}

fn barcode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{10,14}$").expect("valid barcode pattern"))
}

/// Removes the de-duplication counter from a column key.
pub fn strip_suffix(name: &str) -> String {
    suffix_pattern().replace(name, "").into_owned()
}

/// Labels for every column of `table`, in column order.
pub fn derive_labels(table: &Table) -> Vec<String> {
    let mut labels = table
        .columns
        .iter()
        .map(|name| strip_suffix(name))
        .collect::<Vec<_>>();
    for rule in SENTINEL_RULES {
        if apply_rule(rule, table, &mut labels) {
            break;
        }
    }
    labels
}

/// Repairs the first adjacent sentinel pair. Returns whether one was found.
fn apply_rule(rule: &SentinelRule, table: &Table, labels: &mut [String]) -> bool {
    let Some(first) = labels
        .windows(2)
        .position(|pair| pair[0] == rule.sentinel && pair[1] == rule.sentinel)
    else {
        return false;
    };

    let mut next = first + 1;
    for relabel in rule.relabels {
        if let Some(label) = labels.get_mut(next) {
            *label = relabel.to_string();
        }
        next += 1;
    }
    if next < labels.len() && column_looks_like_barcode(table, &table.columns[next]) {
        labels[next] = rule.barcode.to_string();
    }
    true
}

/// True when the column has at least one value and every non-blank value is
/// a 10 to 14 digit number.
fn column_looks_like_barcode(table: &Table, column: &str) -> bool {
    let values = table
        .rows
        .iter()
        .map(|row| row.text(column).trim().to_string())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>();
    !values.is_empty() && values.iter().all(|value| barcode_pattern().is_match(value))
}
