pub mod blob_cache;
pub mod cards;
pub mod cli;
pub mod config;
pub mod csv_text;
pub mod drive;
pub mod fetch;
pub mod header;
pub mod images;
pub mod ingest;
pub mod labels;
pub mod mapper;
pub mod output;
pub mod prune;
pub mod render;
pub mod sheet;
pub mod table;

use std::{env, fs, io::Write, sync::OnceLock, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    blob_cache::BlobCache,
    cards::Card,
    cli::{Cli, Commands},
    config::SiteConfig,
    fetch::{ExportFormat, Fetcher, Source, export_url},
    ingest::CatalogPage,
    mapper::ColumnSelection,
    output::OutputFormat,
};

const DRIVE_HOST: &str = "drive.google.com";

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("catalog_sheets", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Catalog(args) => handle_catalog(&args),
        Commands::Cards(args) => handle_cards(&args),
        Commands::DriveLink(args) => handle_drive_link(&args),
        Commands::Image(args) => handle_image(&args),
        Commands::CachePurge(args) => handle_cache_purge(&args),
    }
}

fn handle_catalog(args: &cli::CatalogArgs) -> Result<()> {
    let mut config = SiteConfig::resolve(args.source.config.as_deref())?;
    if let Some(id) = &args.sheet_id {
        config.price_list.sheet.id = Some(id.clone());
    }
    if let Some(gid) = &args.gid {
        config.price_list.sheet.gid = Some(gid.clone());
    }
    let selection = if args.keep_all_columns {
        ColumnSelection::KeepAll
    } else {
        args.drop_leading
            .map(ColumnSelection::DropLeading)
            .unwrap_or(config.price_list.columns)
    };
    let source = match args.source.input.as_deref() {
        Some(input) => Some(input_source(input)?),
        None => config
            .price_list
            .sheet
            .sheet_id()
            .map(|id| Source::Url(export_url(id, config.price_list.sheet.tab(), ExportFormat::Xlsx))),
    };
    let encoding = output::resolve_encoding(
        args.source
            .input_encoding
            .as_deref()
            .or(config.input_encoding.as_deref()),
    )?;
    match &source {
        Some(source) => info!("Loading price list from {source} ({selection:?})"),
        None => info!("No price list sheet configured"),
    }

    let fetcher = Fetcher::new(config.http_timeout())?;
    let page = ingest::load_catalog(&fetcher, source.as_ref(), selection, encoding);
    write_catalog(&page, args.format, args.output.as_deref())
}

fn write_catalog(
    page: &CatalogPage,
    format: OutputFormat,
    path: Option<&std::path::Path>,
) -> Result<()> {
    let mut writer = output::open_output(path)?;
    match format {
        OutputFormat::Table => {
            writer
                .write_all(render::render_catalog(page).as_bytes())
                .context("Writing catalog table")?;
            if let Some(url) = &page.download_url {
                writeln!(writer, "\nDownload: {url}").context("Writing catalog table")?;
            }
            writer.flush().context("Flushing catalog table")?;
            Ok(())
        }
        OutputFormat::Csv => output::write_csv(writer, &page.labels, &page.table().text_rows()),
        OutputFormat::Json => output::write_json(writer, page),
    }
}

fn handle_cards(args: &cli::CardsArgs) -> Result<()> {
    let config = SiteConfig::resolve(args.source.config.as_deref())?;
    let source = match args.source.input.as_deref() {
        Some(input) => Some(input_source(input)?),
        None => args.feed.source(&config),
    };
    let encoding = output::resolve_encoding(
        args.source
            .input_encoding
            .as_deref()
            .or(config.input_encoding.as_deref()),
    )?;
    debug!("Card source: {source:?}");

    let fetcher = Fetcher::new(config.http_timeout())?;
    let mut cards = cards::load_cards(&fetcher, args.feed, source.as_ref(), encoding);
    if let Some(limit) = args.limit {
        cards.truncate(limit);
    }
    write_cards(&cards, args.format, args.output.as_deref())
}

fn write_cards(cards: &[Card], format: OutputFormat, path: Option<&std::path::Path>) -> Result<()> {
    let mut writer = output::open_output(path)?;
    match format {
        OutputFormat::Table => {
            writer
                .write_all(render::render_cards(cards).as_bytes())
                .context("Writing card table")?;
            writer.flush().context("Flushing card table")?;
            Ok(())
        }
        OutputFormat::Csv => {
            output::write_csv(writer, &render::card_headers(), &render::card_rows(cards))
        }
        OutputFormat::Json => output::write_json(writer, &cards),
    }
}

/// `--input` accepts a URL, a Drive share link, or a local path.
fn input_source(input: &str) -> Result<Source> {
    match Source::parse(input) {
        Some(Source::Url(url)) if url.contains(DRIVE_HOST) => drive::resolve_sheet_link(&url)
            .and_then(|resolved| Source::parse(&resolved))
            .ok_or_else(|| anyhow!("Input location must not be empty")),
        Some(source) => Ok(source),
        None => bail!("Input location must not be empty"),
    }
}

fn handle_drive_link(args: &cli::DriveLinkArgs) -> Result<()> {
    let line = if args.id_only {
        drive::extract_drive_file_id(&args.link)
    } else {
        drive::drive_direct_url(&args.link, args.mode)
    };
    match line {
        Some(line) => {
            println!("{line}");
            Ok(())
        }
        None => bail!("No Google Drive file id found in '{}'", args.link),
    }
}

fn open_cache(args: &cli::CacheArgs) -> Result<(SiteConfig, BlobCache)> {
    let config = SiteConfig::resolve(args.config.as_deref())?;
    let dir = args.cache_dir.clone().unwrap_or_else(|| config.cache.dir());
    let cache = BlobCache::open(dir)?;
    debug!("Using blob cache at {:?}", cache.root());
    Ok((config, cache))
}

fn handle_image(args: &cli::ImageArgs) -> Result<()> {
    let (config, cache) = open_cache(&args.cache)?;
    let fetcher = Fetcher::new(config.http_timeout())?;
    let resolved = images::resolve_image(&cache, &fetcher, &args.src, args.cache_only)
        .ok_or_else(|| anyhow!("No image could be resolved for '{}'", args.src))?;
    fs::write(&args.output, &resolved.bytes)
        .with_context(|| format!("Writing image to {:?}", args.output))?;
    info!(
        "Wrote {} byte(s) from {} to {:?}",
        resolved.bytes.len(),
        resolved.url,
        args.output
    );
    Ok(())
}

fn handle_cache_purge(args: &cli::CachePurgeArgs) -> Result<()> {
    let (config, cache) = open_cache(&args.cache)?;
    let uniform = args
        .ttl_hours
        .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
        .or_else(|| config.cache.ttl());
    let removed = match uniform {
        Some(max_age) => cache.purge_expired(|_| max_age),
        None => cache.purge_expired(images::candidate_ttl),
    }
    .with_context(|| format!("Purging {:?}", cache.root()))?;
    info!("Removed {removed} expired cache entr(ies) from {:?}", cache.root());
    Ok(())
}
