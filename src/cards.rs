//! Promotional cards and blog articles read from fixed-column sheets.
//!
//! These sheets have a single header row followed by one card per row:
//! image URL, title, subtitle, description and, for offers, a discount.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use encoding_rs::Encoding;
use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::{
    config::SiteConfig,
    drive,
    fetch::{CachePolicy, ExportFormat, Fetcher, Source, export_url},
    sheet::{Cell, Sheet},
};

const MAX_DISCOUNT_PERCENT: u8 = 90;
const FEATURED_LIMIT: usize = 3;

const IMAGE_COLUMN: usize = 0;
const TITLE_COLUMN: usize = 1;
const SUBTITLE_COLUMN: usize = 2;
const DESCRIPTION_COLUMN: usize = 3;
const DISCOUNT_COLUMN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<u8>,
}

/// The card feeds the site publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum CardFeed {
    /// Current promotions (workbook at PROMOTION_SHEET_URL)
    Promotions,
    /// Trend highlights (workbook at TREND_SHEET_URL)
    Trends,
    /// Home page teaser: first three offers from the products sheet CSV export
    Featured,
    /// Blog articles from the blog sheet workbook export
    Articles,
}

impl CardFeed {
    pub fn reads_discount(&self) -> bool {
        !matches!(self, CardFeed::Articles)
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            CardFeed::Featured => Some(FEATURED_LIMIT),
            _ => None,
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            CardFeed::Articles => CachePolicy::NoStore,
            _ => CachePolicy::promotions(),
        }
    }

    /// Source configured for this feed, if any.
    pub fn source(&self, config: &SiteConfig) -> Option<Source> {
        match self {
            CardFeed::Promotions => link_source(config.promotion_url.as_deref()),
            CardFeed::Trends => link_source(config.trend_url.as_deref()),
            CardFeed::Featured => {
                let sheet = config.products_sheet.or(&config.blog_sheet);
                sheet
                    .sheet_id()
                    .map(|id| Source::Url(export_url(id, sheet.tab(), ExportFormat::Csv)))
            }
            CardFeed::Articles => config
                .blog_sheet
                .sheet_id()
                .map(|id| Source::Url(export_url(id, config.blog_sheet.tab(), ExportFormat::Xlsx))),
        }
    }
}

fn link_source(link: Option<&str>) -> Option<Source> {
    link.and_then(drive::resolve_sheet_link)
        .and_then(|resolved| Source::parse(&resolved))
}

fn discount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d{1,3}").expect("valid discount pattern"))
}

/// Reads a discount written as `10`, `-10` or `10%`; the result is clamped to 0..=90.
pub fn parse_discount(value: &str) -> Option<u8> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let found = discount_pattern().find(trimmed)?;
    let parsed: i32 = found.as_str().parse().ok()?;
    let clamped = parsed.unsigned_abs().min(u32::from(MAX_DISCOUNT_PERCENT));
    u8::try_from(clamped).ok()
}

fn cell_text(row: &[Cell], idx: usize) -> String {
    row.get(idx)
        .map(|cell| cell.as_text().trim().to_string())
        .unwrap_or_default()
}

/// Builds cards from every row after the header. Rows without a title are skipped.
pub fn read_cards(sheet: &Sheet, with_discount: bool) -> Vec<Card> {
    if sheet.len() < 2 {
        return Vec::new();
    }
    sheet.rows[1..]
        .iter()
        .filter_map(|row| {
            let image_url = cell_text(row, IMAGE_COLUMN);
            let title = cell_text(row, TITLE_COLUMN);
            let subtitle = cell_text(row, SUBTITLE_COLUMN);
            let description = cell_text(row, DESCRIPTION_COLUMN);
            if title.is_empty() {
                return None;
            }
            let discount_percent = if with_discount {
                parse_discount(&cell_text(row, DISCOUNT_COLUMN))
            } else {
                None
            };
            Some(Card {
                image_url: (!image_url.is_empty()).then_some(image_url),
                title,
                subtitle,
                description,
                discount_percent,
            })
        })
        .collect()
}

fn try_load_cards(
    fetcher: &Fetcher,
    feed: CardFeed,
    source: Option<&Source>,
    encoding: &'static Encoding,
) -> Result<Vec<Card>> {
    let source = source.ok_or_else(|| anyhow!("No source configured for {feed:?} cards"))?;
    let payload = fetcher.load(source, feed.cache_policy())?;
    let sheet = Sheet::from_payload(payload, source.format_hint(), encoding)?;
    let mut cards = read_cards(&sheet, feed.reads_discount());
    if let Some(limit) = feed.limit() {
        cards.truncate(limit);
    }
    Ok(cards)
}

/// Loads a card feed. Failures are logged and produce an empty list.
pub fn load_cards(
    fetcher: &Fetcher,
    feed: CardFeed,
    source: Option<&Source>,
    encoding: &'static Encoding,
) -> Vec<Card> {
    match try_load_cards(fetcher, feed, source, encoding) {
        Ok(cards) => {
            info!("Loaded {} {feed:?} card(s)", cards.len());
            cards
        }
        Err(err) => {
            warn!("Could not load {feed:?} cards: {err:#}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetRef;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            rows.iter()
                .map(|row| row.iter().map(|v| Cell::from(*v)).collect())
                .collect(),
        )
    }

    #[test]
    fn discount_accepts_common_spellings() {
        assert_eq!(parse_discount("10"), Some(10));
        assert_eq!(parse_discount("-10"), Some(10));
        assert_eq!(parse_discount("10%"), Some(10));
        assert_eq!(parse_discount(" скидка 25% "), Some(25));
    }

    #[test]
    fn discount_is_clamped() {
        assert_eq!(parse_discount("150%"), Some(90));
        assert_eq!(parse_discount("0"), Some(0));
    }

    #[test]
    fn missing_discount_is_none() {
        assert_eq!(parse_discount(""), None);
        assert_eq!(parse_discount("   "), None);
        assert_eq!(parse_discount("n/a"), None);
    }

    #[test]
    fn header_row_is_skipped_and_untitled_rows_dropped() {
        let cards = read_cards(
            &sheet(&[
                &["image", "title", "subtitle", "description", "discount"],
                &["https://img/a.png", "Green tea", "Loose leaf", "", "15%"],
                &["https://img/b.png", "", "orphan subtitle", "", ""],
                &["", "", "", "", ""],
                &["", "Black tea", "", "Strong", ""],
            ]),
            true,
        );
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].image_url.as_deref(), Some("https://img/a.png"));
        assert_eq!(cards[0].discount_percent, Some(15));
        assert_eq!(cards[1].image_url, None);
        assert_eq!(cards[1].discount_percent, None);
    }

    #[test]
    fn articles_ignore_discount_column() {
        let cards = read_cards(
            &sheet(&[&["h"], &["", "Post", "", "", "50"]]),
            CardFeed::Articles.reads_discount(),
        );
        assert_eq!(cards[0].discount_percent, None);
    }

    #[test]
    fn short_sheets_have_no_cards() {
        assert!(read_cards(&sheet(&[&["image", "title"]]), true).is_empty());
        assert!(read_cards(&Sheet::default(), true).is_empty());
    }

    #[test]
    fn featured_feed_uses_products_then_blog_sheet() {
        let mut config = SiteConfig::default();
        config.blog_sheet = SheetRef {
            id: Some("BLOG".to_string()),
            gid: Some("3".to_string()),
        };
        assert_eq!(
            CardFeed::Featured.source(&config),
            Some(Source::Url(
                "https://docs.google.com/spreadsheets/d/BLOG/export?format=csv&gid=3".to_string()
            ))
        );
        config.products_sheet.id = Some("PRODUCTS".to_string());
        assert_eq!(
            CardFeed::Featured.source(&config),
            Some(Source::Url(
                "https://docs.google.com/spreadsheets/d/PRODUCTS/export?format=csv&gid=3"
                    .to_string()
            ))
        );
        config.products_sheet.gid = Some("9".to_string());
        assert_eq!(
            CardFeed::Featured.source(&config),
            Some(Source::Url(
                "https://docs.google.com/spreadsheets/d/PRODUCTS/export?format=csv&gid=9"
                    .to_string()
            ))
        );
    }

    #[test]
    fn promotions_feed_normalizes_drive_links() {
        let mut config = SiteConfig::default();
        config.promotion_url =
            Some("https://drive.google.com/file/d/1AbCdEfGhIjKlMnOpQrStUvWxYz/view".to_string());
        assert_eq!(
            CardFeed::Promotions.source(&config),
            Some(Source::Url(
                "https://drive.google.com/uc?export=download&id=1AbCdEfGhIjKlMnOpQrStUvWxYz"
                    .to_string()
            ))
        );
        assert_eq!(CardFeed::Trends.source(&config), None);
    }
}
