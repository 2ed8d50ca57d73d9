use crate::model::{RawListing, ScrapeRequest};
use crate::parser::Parser;
use crate::scraper::Scraper;

use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Fetches pages 1..=N of one category and parses every listing card.
///
/// A page that still fails after its retries is skipped. Parsing stops early once a page
/// past the first has no listing containers, since later pages will be empty too.
pub async fn scrape_category<S, P>(
    scraper: &S,
    parser: &P,
    request: &ScrapeRequest,
    page_delay: Duration,
    debug_dir: Option<&Path>,
) -> Vec<RawListing>
where
    S: Scraper + ?Sized,
    P: Parser + ?Sized,
{
    let mut listings = Vec::new();
    let save = |page: u32, html: &str| {
        if let Some(dir) = debug_dir {
            save_debug_html(dir, request, page, html);
        }
    };

    for page in 1..=request.pages {
        if page > 1 && !page_delay.is_zero() {
            sleep(page_delay).await;
        }

        let url = request.page_url(page);
        info!("[{}] Fetching page {}/{}", request.category, page, request.pages);

        let html = match scraper.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("[{}] Skipping page {}: {}", request.category, page, e);
                continue;
            }
        };

        let parsed = match parser.parse_page(&html) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("[{}] Parse error on page {}: {}", request.category, page, e);
                save(page, &html);
                continue;
            }
        };

        if !parsed.has_containers {
            if page == 1 {
                warn!("[{}] No listing containers on the first page", request.category);
                save(page, &html);
                continue;
            }
            info!("[{}] Page {} is empty, stopping", request.category, page);
            break;
        }

        info!("[{}] Page {}: {} listings", request.category, page, parsed.listings.len());
        if parsed.listings.is_empty() {
            save(page, &html);
        }
        listings.extend(parsed.listings);
    }

    listings
}

/// Keeps the HTML of a page that yielded nothing, for inspecting layout changes.
fn save_debug_html(folder: &Path, request: &ScrapeRequest, page: u32, html: &str) {
    if let Err(e) = fs::create_dir_all(folder) {
        warn!("Failed to create debug folder: {}", e);
        return;
    }
    let filename = folder.join(format!("debug-{}-page{}.html", request.category, page));
    if let Err(e) = fs::write(&filename, html) {
        warn!("Failed to write debug HTML: {}", e);
    } else {
        info!("Saved debug HTML: {}", filename.display());
    }
}
