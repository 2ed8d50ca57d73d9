pub mod crawler;
pub mod fetcher;
pub mod traits;

pub use crawler::scrape_category;
pub use fetcher::ScraperImpl;
pub use traits::Scraper;
