use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{cards::CardFeed, drive::DriveMode, output::OutputFormat};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Fetch and normalize catalog data published as spreadsheets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the price list and print it as a normalized catalog table
    Catalog(CatalogArgs),
    /// Fetch a promotion, trend, featured-offer or article feed
    Cards(CardsArgs),
    /// Convert a Google Drive share link or file id into a direct URL
    DriveLink(DriveLinkArgs),
    /// Resolve an image source through the local blob cache
    Image(ImageArgs),
    /// Remove expired entries from the local blob cache
    CachePurge(CachePurgeArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// YAML file with sheet ids, links, and cache settings
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Read from this URL or local file instead of the configured sheet
    #[arg(short = 'i', long = "input")]
    pub input: Option<String>,
    /// Character encoding of CSV payloads (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Spreadsheet id of the published price list
    #[arg(long = "sheet-id")]
    pub sheet_id: Option<String>,
    /// Tab (gid) of the price list sheet
    #[arg(long)]
    pub gid: Option<String>,
    /// Number of leading columns to ignore by position (defaults to the configured policy)
    #[arg(long = "drop-leading", conflicts_with = "keep_all_columns")]
    pub drop_leading: Option<usize>,
    /// Keep every column, including the leading row-number column
    #[arg(long = "keep-all-columns")]
    pub keep_all_columns: bool,
    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CardsArgs {
    /// Which feed to read
    #[arg(long = "feed", value_enum)]
    pub feed: CardFeed,
    #[command(flatten)]
    pub source: SourceArgs,
    /// Keep at most this many cards
    #[arg(long)]
    pub limit: Option<usize>,
    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DriveLinkArgs {
    /// Share link, `open?id=` link, or bare file id
    pub link: String,
    /// Direct link flavour (view or download)
    #[arg(long, value_parser = parse_drive_mode, default_value = "view")]
    pub mode: DriveMode,
    /// Print only the extracted file id
    #[arg(long = "id-only")]
    pub id_only: bool,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    /// YAML file with cache settings
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Cache directory (overrides config and CATALOG_SHEETS_CACHE_DIR)
    #[arg(long = "cache-dir")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Image source as written in the sheet
    pub src: String,
    #[command(flatten)]
    pub cache: CacheArgs,
    /// Destination file for the image bytes
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Never touch the network; fail when the image is not cached
    #[arg(long = "cache-only")]
    pub cache_only: bool,
}

#[derive(Debug, Args)]
pub struct CachePurgeArgs {
    #[command(flatten)]
    pub cache: CacheArgs,
    /// Maximum entry age in hours for every entry (defaults to `cache.ttl_hours`,
    /// then to 24 h per entry, 48 h for ImageKit URLs)
    #[arg(long = "ttl-hours")]
    pub ttl_hours: Option<u64>,
}

pub fn parse_drive_mode(value: &str) -> Result<DriveMode, String> {
    value.parse::<DriveMode>().map_err(|err| err.to_string())
}
