pub mod sqlite;

pub use sqlite::{ScrapeRun, SqliteStorage};
