mod analyzer;
mod cli;
mod config;
mod export;
mod model;
mod normalizer;
mod parser;
mod scraper;
mod storage;
mod utils;

use analyzer::{Analyzer, AnalyzerImpl};
use chrono::Utc;
use clap::Parser as _;
use cli::{Cli, Command};
use config::{clamp_pages, load_config_or_default, AppConfig, CategoryConfig};
use futures::future::join_all;
use model::{AppError, Category, Listing, ScrapeRequest};
use normalizer::{clean, dedup};
use parser::{DakarAutoParser, Parser};
use crate::scraper::{scrape_category, Scraper, ScraperImpl};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use storage::{ScrapeRun, SqliteStorage};
use tokio::sync::Mutex;
use tracing::{error, info, warn, Level};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = load_config_or_default(&cli.config)?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    let config = Arc::new(config);

    let storage = Arc::new(Mutex::new(SqliteStorage::new(&config.database_path)?));

    match cli.command {
        Command::Scrape { pages, categories, csv_dir } => {
            let pages = clamp_pages(pages.unwrap_or(config.pages_per_category));
            scrape(config, storage, pages, &categories, csv_dir.as_deref()).await
        }
        Command::Report { json, categories } => {
            let listings = load_listings(&storage, &categories).await?;
            let report = AnalyzerImpl::new().build_report(&listings);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
            Ok(())
        }
        Command::Export { category, output } => {
            let selected: Vec<Category> = category.into_iter().collect();
            let listings = load_listings(&storage, &selected).await?;
            let path = output.unwrap_or_else(|| match category {
                Some(c) => PathBuf::from(export::category_file_name(c)),
                None => PathBuf::from(export::ALL_FILE_NAME),
            });
            export::export_file(&listings, &path)?;
            Ok(())
        }
    }
}

/// The configured categories, narrowed to `selected` when it is non-empty.
fn selected_categories<'a>(config: &'a AppConfig, selected: &[Category]) -> Vec<&'a CategoryConfig> {
    config
        .categories
        .iter()
        .filter(|c| selected.is_empty() || selected.contains(&c.category))
        .collect()
}

async fn scrape(
    config: Arc<AppConfig>,
    storage: Arc<Mutex<SqliteStorage>>,
    pages: u32,
    selected: &[Category],
    csv_dir: Option<&Path>,
) -> Result<(), AppError> {
    let scraper = ScraperImpl::new(&config)?;
    let parser = DakarAutoParser::new()?;

    let targets = selected_categories(&config, selected);
    info!("Scraping {} categories, {} pages each", targets.len(), pages);

    // All categories concurrently; pages within a category stay sequential
    let tasks: Vec<_> = targets
        .into_iter()
        .map(|target| {
            process_category(target, pages, &scraper, &parser, storage.clone(), config.clone(), csv_dir)
        })
        .collect();
    let results = join_all(tasks).await;

    let mut failed = 0;
    for result in results {
        if let Err(e) = result {
            warn!("{}", e);
            failed += 1;
        }
    }
    if failed > 0 {
        warn!("{} categories failed", failed);
    }

    for (category, count) in storage.lock().await.category_counts()? {
        info!("Stored {:>5} {}", count, category);
    }
    info!("Data saved to {}", config.database_path);
    Ok(())
}

/// Scrapes, cleans and stores one category. Stored rows survive a scrape that finds nothing.
async fn process_category<S, P>(
    target: &CategoryConfig,
    pages: u32,
    scraper: &S,
    parser: &P,
    storage: Arc<Mutex<SqliteStorage>>,
    config: Arc<AppConfig>,
    csv_dir: Option<&Path>,
) -> Result<usize, AppError>
where
    S: Scraper + ?Sized,
    P: Parser + ?Sized,
{
    let category = target.category;
    let request = ScrapeRequest {
        category,
        base_url: target.base_url.clone(),
        pages,
    };

    if let Ok(Some(prev)) = storage.lock().await.last_run(category) {
        info!(
            "[{}] Previous run: {} listings from {} pages at {}",
            category, prev.listings, prev.pages, prev.finished_at
        );
    }

    let raw = scrape_category(
        scraper,
        parser,
        &request,
        Duration::from_millis(config.page_delay_ms),
        Some(Path::new(&config.debug_html_dir)),
    )
    .await;

    let listings = clean(&raw, category);
    info!("[{}] {} raw -> {} clean listings", category, raw.len(), listings.len());

    if listings.is_empty() {
        warn!("[{}] Nothing scraped, keeping previously stored rows", category);
        return Ok(0);
    }

    let stored = {
        let mut guard = storage.lock().await;
        let stored = guard.replace_category(category, &listings)?;
        guard.record_run(&ScrapeRun {
            category,
            pages,
            listings: stored,
            finished_at: Utc::now(),
        })?;
        stored
    };

    if let Some(dir) = csv_dir {
        export::export_file(&listings, &dir.join(export::category_file_name(category)))?;
    }

    Ok(stored)
}

/// Loads stored listings for `selected` (all when empty) and drops duplicate rows.
async fn load_listings(storage: &Mutex<SqliteStorage>, selected: &[Category]) -> Result<Vec<Listing>, AppError> {
    let guard = storage.lock().await;
    let listings = if selected.is_empty() {
        guard.load_all()?
    } else {
        let mut listings = Vec::new();
        for category in selected {
            listings.extend(guard.load_category(*category)?);
        }
        listings
    };
    Ok(dedup(listings))
}
