use crate::model::Category;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scrape dakar-auto.com vehicle listings into SQLite and report on them.
#[derive(Debug, Parser)]
#[command(name = "dakar-sniper", version, about)]
pub struct Cli {
    /// JSON config file; built-in defaults are used when it does not exist
    #[arg(long, global = true, default_value = "config.json")]
    pub config: String,

    /// Database path, overriding the config
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, clean and store listings (replaces stored rows per category)
    Scrape {
        /// Pages per category (1-50)
        #[arg(short, long)]
        pages: Option<u32>,

        /// Only these categories (cars, rental, motorcycles); repeatable
        #[arg(short, long = "category")]
        categories: Vec<Category>,

        /// Also write <category>_scraped.csv files here
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },
    /// Summary statistics over the stored listings
    Report {
        #[arg(long)]
        json: bool,

        #[arg(short, long = "category")]
        categories: Vec<Category>,
    },
    /// Write stored listings to CSV
    Export {
        #[arg(short, long)]
        category: Option<Category>,

        /// Defaults to <category>_scraped.csv or dakar_auto_scraped_all.csv
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scrape_with_repeated_categories() {
        let cli = Cli::try_parse_from([
            "dakar-sniper", "scrape", "--pages", "3", "-c", "cars", "-c", "motos",
        ])
        .unwrap();
        match cli.command {
            Command::Scrape { pages, categories, csv_dir } => {
                assert_eq!(pages, Some(3));
                assert_eq!(categories, vec![Category::Cars, Category::Motorcycles]);
                assert!(csv_dir.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, "config.json");
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["dakar-sniper", "report", "--json", "--db", "x.db", "-v"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Report { json: true, .. }));
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(Cli::try_parse_from(["dakar-sniper", "export", "--category", "boats"]).is_err());
    }
}
