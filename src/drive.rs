//! Google Drive share-link normalization.
//!
//! Promotion sheets are configured as whatever link an editor copied: a
//! `/file/d/<id>/view` page, an `open?id=` link, a bare id, sometimes wrapped
//! in quotes or angle brackets. These helpers recover the file id and build a
//! direct URL that returns the file itself.

use std::{fmt, str::FromStr, sync::OnceLock};

use anyhow::{Result, bail};
use regex::Regex;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    #[default]
    View,
    Download,
}

impl DriveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveMode::View => "view",
            DriveMode::Download => "download",
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriveMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(DriveMode::View),
            "download" => Ok(DriveMode::Download),
            other => bail!("Unknown Drive link mode '{other}' (expected view or download)"),
        }
    }
}

fn raw_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[-A-Za-z0-9_]{25,}$").expect("valid id pattern"))
}

fn file_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/file/d/([-A-Za-z0-9_]{25,})").expect("valid path pattern")
    })
}

fn any_d_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/d/([-A-Za-z0-9_]{25,})").expect("valid path pattern"))
}

fn embedded_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-A-Za-z0-9_]{25,}").expect("valid id pattern"))
}

fn is_wrapper(ch: char) -> bool {
    ch == '@' || ch == '"' || ch == '\'' || ch == '<' || ch == '>' || ch.is_whitespace()
}

/// Adds `https:` to protocol-relative input and `https://` to bare hosts.
pub fn with_https_scheme(input: &str) -> String {
    let lowered = input.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        input.to_string()
    } else if input.starts_with("//") {
        format!("https:{input}")
    } else {
        format!("https://{input}")
    }
}

/// Extracts a Drive file id from a share link or a raw id.
pub fn extract_drive_file_id(input: &str) -> Option<String> {
    let cleaned = input.trim_matches(is_wrapper);
    if cleaned.is_empty() {
        return None;
    }
    if raw_id_pattern().is_match(cleaned) {
        return Some(cleaned.to_string());
    }

    if let Ok(url) = Url::parse(&with_https_scheme(cleaned)) {
        let query_id = url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned());
        if let Some(id) = query_id.filter(|id| raw_id_pattern().is_match(id)) {
            return Some(id);
        }
        for pattern in [file_path_pattern(), any_d_path_pattern()] {
            if let Some(found) = pattern.captures(url.path()).and_then(|caps| caps.get(1)) {
                return Some(found.as_str().to_string());
            }
        }
    }

    embedded_id_pattern()
        .find(cleaned)
        .map(|found| found.as_str().to_string())
}

/// Direct `uc?export=` URL for a Drive link, or `None` when no id is found.
pub fn drive_direct_url(input: &str, mode: DriveMode) -> Option<String> {
    extract_drive_file_id(input)
        .map(|id| format!("https://drive.google.com/uc?export={mode}&id={id}"))
}

/// Resolves a configured sheet link: Drive links become direct downloads,
/// anything else is used as given.
pub fn resolve_sheet_link(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(drive_direct_url(trimmed, DriveMode::Download).unwrap_or_else(|| trimmed.to_string()))
}
