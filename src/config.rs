//! Site configuration: which sheets feed which pages.
//!
//! Settings come from an optional YAML file and are then overridden by the
//! environment variables the site deployment already defines
//! (`PRICE_SHEET_ID`, `PROMOTION_SHEET_URL`, ...). Command line flags are
//! applied on top by the CLI handlers.

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{fetch::DEFAULT_TIMEOUT_SECS, mapper::ColumnSelection};

pub const CACHE_DIR_ENV: &str = "CATALOG_SHEETS_CACHE_DIR";
const DEFAULT_CACHE_DIR_NAME: &str = "catalog-sheets-cache";

/// A published sheet and, optionally, one tab of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetRef {
    pub id: Option<String>,
    pub gid: Option<String>,
}

impl SheetRef {
    pub fn sheet_id(&self) -> Option<&str> {
        non_blank(self.id.as_deref())
    }

    pub fn tab(&self) -> Option<&str> {
        non_blank(self.gid.as_deref())
    }

    /// Id and tab each taken from `self` when set, otherwise from `fallback`.
    pub fn or(&self, fallback: &SheetRef) -> SheetRef {
        SheetRef {
            id: self.sheet_id().or(fallback.sheet_id()).map(str::to_string),
            gid: self.tab().or(fallback.tab()).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceListConfig {
    #[serde(flatten)]
    pub sheet: SheetRef,
    pub columns: ColumnSelection,
}

impl Default for PriceListConfig {
    fn default() -> Self {
        Self {
            sheet: SheetRef::default(),
            // the price list starts with an internal row-number column
            columns: ColumnSelection::DropLeading(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
    /// Uniform purge age. Unset means each entry keeps the lifetime of its URL.
    pub ttl_hours: Option<u64>,
}

impl CacheConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_CACHE_DIR_NAME))
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_hours
            .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub price_list: PriceListConfig,
    pub blog_sheet: SheetRef,
    pub products_sheet: SheetRef,
    pub promotion_url: Option<String>,
    pub trend_url: Option<String>,
    pub http_timeout_secs: u64,
    pub input_encoding: Option<String>,
    pub cache: CacheConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            price_list: PriceListConfig::default(),
            blog_sheet: SheetRef::default(),
            products_sheet: SheetRef::default(),
            promotion_url: None,
            trend_url: None,
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            input_encoding: None,
            cache: CacheConfig::default(),
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening config file {path:?}"))?;
        let config = serde_yaml::from_str(&raw)
            .with_context(|| format!("Parsing config file {path:?}"))?;
        Ok(config)
    }

    /// File settings (if any) overridden by the process environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let set = |slot: &mut Option<String>, key: &str| {
            if let Some(value) = get(key) {
                debug!("Using {key} from environment");
                *slot = Some(value);
            }
        };
        set(&mut self.price_list.sheet.id, "PRICE_SHEET_ID");
        set(&mut self.price_list.sheet.gid, "PRICE_SHEET_GID");
        set(&mut self.blog_sheet.id, "BLOG_SHEET_ID");
        set(&mut self.blog_sheet.gid, "BLOG_SHEET_GID");
        set(&mut self.products_sheet.id, "PRODUCTS_SHEET_ID");
        set(&mut self.products_sheet.gid, "PRODUCTS_SHEET_GID");
        set(&mut self.promotion_url, "PROMOTION_SHEET_URL");
        set(&mut self.trend_url, "TREND_SHEET_URL");
        if let Some(dir) = get(CACHE_DIR_ENV) {
            self.cache.dir = Some(PathBuf::from(dir));
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
