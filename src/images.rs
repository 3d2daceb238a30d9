use std::time::Duration;

use log::debug;
use url::Url;

use crate::{
    blob_cache::BlobCache,
    drive::with_https_scheme,
    fetch::Fetcher,
};

pub const IMAGEKIT_HOST: &str = "ik.imagekit.io";
pub const DEFAULT_IMAGE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const IMAGEKIT_TTL: Duration = Duration::from_secs(48 * 60 * 60);

/// URLs to try, in order, for an image source as written in a sheet.
///
/// CDN URLs are used as given, followed by the same URL without its query.
/// Everything else gets an https scheme and is normalized through URL parsing.
pub fn image_candidates(src: &str) -> Vec<String> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.contains(IMAGEKIT_HOST) {
        let mut list = vec![trimmed.to_string()];
        if let Some((base, _)) = trimmed.split_once('?') {
            list.push(base.to_string());
        }
        return list;
    }

    let with_scheme = with_https_scheme(trimmed);
    let secure = match with_scheme.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("http://") => {
            format!("https://{}", &with_scheme[7..])
        }
        _ => with_scheme,
    };
    match Url::parse(&secure) {
        Ok(url) => vec![url.to_string()],
        Err(_) => vec![secure],
    }
}

/// Cache lifetime for a candidate URL.
pub fn candidate_ttl(url: &str) -> Duration {
    if url.contains(IMAGEKIT_HOST) {
        IMAGEKIT_TTL
    } else {
        DEFAULT_IMAGE_TTL
    }
}

/// A resolved image and the candidate URL it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Walks the candidates of `src`, returning the first blob found.
///
/// With `cache_only` the network is never touched and only cached candidates
/// can match.
pub fn resolve_image(
    cache: &BlobCache,
    fetcher: &Fetcher,
    src: &str,
    cache_only: bool,
) -> Option<ResolvedImage> {
    for candidate in image_candidates(src) {
        let ttl = candidate_ttl(&candidate);
        let cached = cache.get_or_log(&candidate, ttl);
        let found = match cached {
            Some(bytes) => Some(bytes),
            None if cache_only => {
                debug!("Cache miss for {candidate}; not fetching");
                None
            }
            None => cache.get_or_fetch(fetcher, &candidate, ttl),
        };
        if let Some(bytes) = found {
            return Some(ResolvedImage {
                url: candidate,
                bytes,
            });
        }
    }
    None
}
