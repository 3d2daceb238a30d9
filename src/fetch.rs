//! Remote and local retrieval of spreadsheet exports and image blobs. One GET
//! per call, no retries.

use std::{fmt, fs, path::PathBuf, time::Duration};

use log::debug;
use reqwest::{StatusCode, blocking::Client, header};
use thiserror::Error;

use crate::sheet::SheetFormat;

pub const SHEETS_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Revalidation window used for promotional content.
pub const PROMOTION_REVALIDATE_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no source location configured")]
    MissingLocation,
    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: StatusCode },
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("reading {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("building HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Freshness hint sent with a request. Advisory only: intermediaries decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NoStore,
    Revalidate(Duration),
}

impl CachePolicy {
    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::NoStore => "no-store".to_string(),
            CachePolicy::Revalidate(window) => format!("max-age={}", window.as_secs()),
        }
    }

    pub fn promotions() -> Self {
        CachePolicy::Revalidate(Duration::from_secs(PROMOTION_REVALIDATE_SECS))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Export URL for a published sheet, optionally narrowed to one tab.
pub fn export_url(sheet_id: &str, gid: Option<&str>, format: ExportFormat) -> String {
    let base = format!(
        "{SHEETS_EXPORT_BASE}/{id}/export?format={fmt}",
        id = sheet_id.trim(),
        fmt = format.as_str()
    );
    match gid.map(str::trim).filter(|g| !g.is_empty()) {
        Some(gid) => format!("{base}&gid={gid}"),
        None => base,
    }
}

/// Where a sheet payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// Treats strings with an `http(s)://` scheme as URLs and anything else as a path.
    pub fn parse(location: &str) -> Option<Source> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Some(Source::Url(trimmed.to_string()))
        } else {
            Some(Source::File(PathBuf::from(trimmed)))
        }
    }

    pub fn location(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }

    pub fn format_hint(&self) -> Option<SheetFormat> {
        SheetFormat::from_location(&self.location())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location())
    }
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// GETs `url` and returns the body. Any non-2xx status is an error.
    pub fn get_bytes(&self, url: &str, policy: CachePolicy) -> Result<Vec<u8>, FetchError> {
        debug!("GET {url} ({})", policy.header_value());
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .header(header::CACHE_CONTROL, policy.header_value())
            .send()
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.bytes().map_err(transport)?;
        debug!("Received {} byte(s) from {url}", body.len());
        Ok(body.to_vec())
    }

    pub fn load(&self, source: &Source, policy: CachePolicy) -> Result<Vec<u8>, FetchError> {
        match source {
            Source::Url(url) => self.get_bytes(url, policy),
            Source::File(path) => fs::read(path).map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            }),
        }
    }
}
