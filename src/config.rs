use crate::model::{Category, ConfigError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const MAX_PAGES: u32 = 50;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryConfig {
    pub category: Category,
    /// Listing URL up to and including `page=`; the page number is appended.
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub pages_per_category: u32,
    pub categories: Vec<CategoryConfig>,
    pub request_timeout_seconds: u64,
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub jitter_ms: u64,
    pub page_delay_ms: u64,
    pub user_agent: String,
    pub debug_html_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "dakar_auto_data.db".into(),
            pages_per_category: 1,
            categories: vec![
                CategoryConfig {
                    category: Category::Cars,
                    base_url: "https://dakar-auto.com/senegal/voitures-4?&page=".into(),
                },
                CategoryConfig {
                    category: Category::Rental,
                    base_url: "https://dakar-auto.com/senegal/location-de-voitures-19?&page=".into(),
                },
                CategoryConfig {
                    category: Category::Motorcycles,
                    base_url: "https://dakar-auto.com/senegal/motos-and-scooters-3?&page=".into(),
                },
            ],
            request_timeout_seconds: 15,
            max_retries: 3,
            base_backoff_ms: 500,
            jitter_ms: 250,
            page_delay_ms: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) DakarSniperBot/0.1".into(),
            debug_html_dir: "logs/html".into(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::Invalid("no categories configured".into()));
        }
        if let Some(c) = self.categories.iter().find(|c| c.base_url.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("empty base_url for {}", c.category)));
        }
        Ok(())
    }
}

/// Page count requested on the command line, kept within 1..=50.
pub fn clamp_pages(pages: u32) -> u32 {
    pages.clamp(1, MAX_PAGES)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Like `load_config`, but a missing file means built-in defaults.
pub fn load_config_or_default(path: &str) -> Result<AppConfig, ConfigError> {
    if !Path::new(path).exists() {
        info!("Config {} not found, using defaults", path);
        return Ok(AppConfig::default());
    }
    load_config(path)
}
