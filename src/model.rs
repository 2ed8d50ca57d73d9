// Core structs: RawListing, Listing, Category, error types
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_YEAR: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Category {
    Cars,
    Rental,
    Motorcycles,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cars, Category::Rental, Category::Motorcycles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cars => "cars",
            Category::Rental => "rental",
            Category::Motorcycles => "motorcycles",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the canonical names plus the French table names older databases used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cars" | "voitures" => Ok(Category::Cars),
            "rental" | "location" => Ok(Category::Rental),
            "motorcycles" | "motos" => Ok(Category::Motorcycles),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Fields as found in one listing card, before any cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawListing {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub reference: Option<String>,
    pub km: Option<String>,
    pub fuel: Option<String>,
    pub gearbox: Option<String>,
    pub price: Option<String>,
    pub owner: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub reference: String,
    pub km: i64,
    pub fuel: String,
    pub gearbox: String,
    pub price: i64,
    pub owner: String,
    pub address: String,
    pub category: Category,
}

impl Listing {
    pub const COLUMNS: usize = 11;
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub category: Category,
    pub base_url: String,
    pub pages: u32,
}

impl ScrapeRequest {
    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}", self.base_url, page)
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status {0}")]
    InvalidResponse(u16),
}

impl ScraperError {
    /// Transport failures, timeouts, throttling and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScraperError::HttpError(_) | ScraperError::Timeout => true,
            ScraperError::InvalidResponse(status) => *status == 429 || *status >= 500,
        }
    }
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScraperError::Timeout
        } else {
            ScraperError::HttpError(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector `{0}`")]
    HtmlParseError(String),
    #[error("missing field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("cannot serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_canonical_and_legacy_names() {
        assert_eq!("cars".parse::<Category>().unwrap(), Category::Cars);
        assert_eq!("Voitures".parse::<Category>().unwrap(), Category::Cars);
        assert_eq!("location".parse::<Category>().unwrap(), Category::Rental);
        assert_eq!(" motos ".parse::<Category>().unwrap(), Category::Motorcycles);
        assert!("boats".parse::<Category>().is_err());
    }

    #[test]
    fn category_deserializes_like_it_parses() {
        let cat: Category = serde_json::from_str(r#""Voitures""#).unwrap();
        assert_eq!(cat, Category::Cars);
        let cat: Category = serde_json::from_str(r#""MOTORCYCLES""#).unwrap();
        assert_eq!(cat, Category::Motorcycles);
        assert!(serde_json::from_str::<Category>(r#""boats""#).is_err());
        assert_eq!(serde_json::to_string(&Category::Rental).unwrap(), r#""rental""#);
    }

    #[test]
    fn page_url_appends_page_number() {
        let req = ScrapeRequest {
            category: Category::Cars,
            base_url: "https://dakar-auto.com/senegal/voitures-4?&page=".into(),
            pages: 2,
        };
        assert_eq!(req.page_url(2), "https://dakar-auto.com/senegal/voitures-4?&page=2");
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(ScraperError::Timeout.is_retryable());
        assert!(ScraperError::HttpError("reset".into()).is_retryable());
        assert!(ScraperError::InvalidResponse(503).is_retryable());
        assert!(ScraperError::InvalidResponse(429).is_retryable());
        assert!(!ScraperError::InvalidResponse(404).is_retryable());
    }
}
