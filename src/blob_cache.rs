//! On-disk blob cache keyed by URL. An entry without its `.json` metadata is absent.

use std::{
    fmt::Write as _,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fetch::{CachePolicy, Fetcher};

const BLOB_EXTENSION: &str = "bin";
const META_EXTENSION: &str = "json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlobCache {
    root: PathBuf,
}

impl BlobCache {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Creating cache directory {root:?}"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cached bytes for `url` if present and not older than `max_age`.
    pub fn get(&self, url: &str, max_age: Duration) -> Result<Option<Vec<u8>>> {
        let key = cache_key(url);
        let Some(meta) = self.read_meta(&key)? else {
            return Ok(None);
        };
        if meta.url != url || !is_fresh(meta.stored_at, Utc::now(), max_age) {
            return Ok(None);
        }
        match fs::read(self.blob_path(&key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Reading cached blob for {url}")),
        }
    }

    pub fn put(&self, url: &str, bytes: &[u8]) -> Result<()> {
        self.put_at(url, bytes, Utc::now())
    }

    pub(crate) fn put_at(&self, url: &str, bytes: &[u8], stored_at: DateTime<Utc>) -> Result<()> {
        let key = cache_key(url);
        let blob_path = self.blob_path(&key);
        fs::write(&blob_path, bytes).with_context(|| format!("Writing {blob_path:?}"))?;
        let meta = EntryMeta {
            url: url.to_string(),
            stored_at,
        };
        let meta_path = self.meta_path(&key);
        let serialized = serde_json::to_vec(&meta).context("Serializing cache metadata")?;
        fs::write(&meta_path, serialized).with_context(|| format!("Writing {meta_path:?}"))?;
        Ok(())
    }

    /// Like [`BlobCache::get`], but cache read errors are logged and read as a miss.
    pub fn get_or_log(&self, url: &str, max_age: Duration) -> Option<Vec<u8>> {
        match self.get(url, max_age) {
            Ok(found) => found,
            Err(err) => {
                debug!("Ignoring cache read error for {url}: {err:#}");
                None
            }
        }
    }

    /// Cache failures never prevent a fetch; fetch failures return `None`.
    pub fn get_or_fetch(&self, fetcher: &Fetcher, url: &str, max_age: Duration) -> Option<Vec<u8>> {
        if let Some(bytes) = self.get_or_log(url, max_age) {
            debug!("Cache hit for {url}");
            return Some(bytes);
        }
        let bytes = match fetcher.get_bytes(url, CachePolicy::NoStore) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Fetching {url} failed: {err}");
                return None;
            }
        };
        if let Err(err) = self.put(url, &bytes) {
            warn!("Could not store {url} in cache: {err:#}");
        }
        Some(bytes)
    }

    /// Deletes orphaned blobs and entries older than `max_age(url)`. Returns
    /// the number of entries removed.
    pub fn purge_expired<F>(&self, max_age: F) -> Result<usize>
    where
        F: Fn(&str) -> Duration,
    {
        let now = Utc::now();
        let mut removed = 0usize;
        let entries =
            fs::read_dir(&self.root).with_context(|| format!("Listing {:?}", self.root))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let keep = match self.read_meta(key) {
                Ok(Some(meta)) => is_fresh(meta.stored_at, now, max_age(&meta.url)),
                Ok(None) | Err(_) => false,
            };
            if keep {
                continue;
            }
            remove_if_present(&self.meta_path(key))?;
            remove_if_present(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    fn read_meta(&self, key: &str) -> Result<Option<EntryMeta>> {
        let path = self.meta_path(key);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("Reading {path:?}")),
        };
        let meta = serde_json::from_slice(&raw).with_context(|| format!("Parsing {path:?}"))?;
        Ok(Some(meta))
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{BLOB_EXTENSION}"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{META_EXTENSION}"))
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("Removing {path:?}")),
    }
}

pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut key = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(key, "{byte:02x}");
    }
    key
}

/// An entry expires only once it is strictly older than `max_age`. Entries
/// stamped in the future count as brand new.
fn is_fresh(stored_at: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    let age = now
        .signed_duration_since(stored_at)
        .to_std()
        .unwrap_or(Duration::ZERO);
    age <= max_age
}
