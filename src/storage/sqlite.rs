use crate::model::{Category, Listing, StorageError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;

const LISTING_COLUMNS: &str =
    "brand, model, year, reference, km, fuel, gearbox, price, owner, address, category";

/// One completed scrape of a category.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRun {
    pub category: Category,
    pub pages: u32,
    pub listings: usize,
    pub finished_at: DateTime<Utc>,
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database file and runs migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::init(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                brand TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL,
                reference TEXT NOT NULL,
                km INTEGER NOT NULL,
                fuel TEXT NOT NULL,
                gearbox TEXT NOT NULL,
                price INTEGER NOT NULL,
                owner TEXT NOT NULL,
                address TEXT NOT NULL,
                category TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category);

            CREATE TABLE IF NOT EXISTS scrape_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                pages INTEGER NOT NULL,
                listings INTEGER NOT NULL,
                finished_at TEXT NOT NULL
            );
            ",
        )?;

        Self::migrate_add_column_if_missing(&conn, "listings", "scraped_at", "TEXT NOT NULL DEFAULT ''")?;

        Ok(Self { conn })
    }

    /// Adds a column to an existing table when an older database lacks it.
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Replaces every stored listing of `category` with `listings`, atomically.
    pub fn replace_category(&mut self, category: Category, listings: &[Listing]) -> Result<usize, StorageError> {
        let scraped_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM listings WHERE category = ?1", params![category.as_str()])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO listings ({}, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                LISTING_COLUMNS
            ))?;
            for listing in listings {
                stmt.execute(params![
                    &listing.brand,
                    &listing.model,
                    listing.year,
                    &listing.reference,
                    listing.km,
                    &listing.fuel,
                    &listing.gearbox,
                    listing.price,
                    &listing.owner,
                    &listing.address,
                    category.as_str(),
                    &scraped_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(listings.len())
    }

    pub fn load_category(&self, category: Category) -> Result<Vec<Listing>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM listings WHERE category = ?1 ORDER BY id ASC",
            LISTING_COLUMNS
        ))?;
        let rows = stmt.query_map(params![category.as_str()], Self::map_listing)?;

        let mut listings = Vec::new();
        for listing in rows {
            listings.push(listing?);
        }
        Ok(listings)
    }

    pub fn load_all(&self) -> Result<Vec<Listing>, StorageError> {
        let mut listings = Vec::new();
        for category in Category::ALL {
            listings.extend(self.load_category(category)?);
        }
        Ok(listings)
    }

    /// Number of stored listings per category; categories without rows are omitted.
    pub fn category_counts(&self) -> Result<BTreeMap<Category, usize>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT category, COUNT(*) FROM listings GROUP BY category")?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((category, count))
        })?;

        let mut result = BTreeMap::new();
        for row in rows {
            let (category, count) = row?;
            result.insert(category.parse::<Category>()?, count as usize);
        }
        Ok(result)
    }

    pub fn record_run(&self, run: &ScrapeRun) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO scrape_runs (category, pages, listings, finished_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                run.category.as_str(),
                run.pages,
                run.listings as i64,
                run.finished_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn last_run(&self, category: Category) -> Result<Option<ScrapeRun>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT pages, listings, finished_at FROM scrape_runs
             WHERE category = ?1 ORDER BY id DESC LIMIT 1",
        )?;

        let mut rows = stmt.query(params![category.as_str()])?;
        if let Some(row) = rows.next()? {
            let pages: u32 = row.get(0)?;
            let listings: i64 = row.get(1)?;
            let finished_at_str: String = row.get(2)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_at_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                })?
                .with_timezone(&Utc);

            Ok(Some(ScrapeRun {
                category,
                pages,
                listings: listings as usize,
                finished_at,
            }))
        } else {
            Ok(None)
        }
    }

    fn map_listing(row: &Row) -> Result<Listing, rusqlite::Error> {
        let category_str: String = row.get(10)?;
        let category = category_str.parse::<Category>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Listing {
            brand: row.get(0)?,
            model: row.get(1)?,
            year: row.get(2)?,
            reference: row.get(3)?,
            km: row.get(4)?,
            fuel: row.get(5)?,
            gearbox: row.get(6)?,
            price: row.get(7)?,
            owner: row.get(8)?,
            address: row.get(9)?,
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(brand: &str, price: i64, category: Category) -> Listing {
        Listing {
            brand: brand.into(),
            model: "Corolla".into(),
            year: 2016,
            reference: "42".into(),
            km: 90_000,
            fuel: "Essence".into(),
            gearbox: "Manuelle".into(),
            price,
            owner: "Unknown".into(),
            address: "Dakar".into(),
            category,
        }
    }

    #[test]
    fn round_trips_listings_in_insertion_order() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let cars = vec![listing("Toyota", 100, Category::Cars), listing("Kia", 50, Category::Cars)];

        assert_eq!(storage.replace_category(Category::Cars, &cars).unwrap(), 2);
        assert_eq!(storage.load_category(Category::Cars).unwrap(), cars);
        assert!(storage.load_category(Category::Rental).unwrap().is_empty());
    }

    #[test]
    fn replace_only_touches_its_category() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .replace_category(Category::Cars, &[listing("Toyota", 100, Category::Cars)])
            .unwrap();
        storage
            .replace_category(Category::Motorcycles, &[listing("Yamaha", 10, Category::Motorcycles)])
            .unwrap();
        storage
            .replace_category(Category::Cars, &[listing("Ford", 300, Category::Cars)])
            .unwrap();

        let all = storage.load_all().unwrap();
        let brands: Vec<_> = all.iter().map(|l| l.brand.as_str()).collect();
        assert_eq!(brands, vec!["Ford", "Yamaha"]);

        let counts = storage.category_counts().unwrap();
        assert_eq!(counts.get(&Category::Cars), Some(&1));
        assert_eq!(counts.get(&Category::Motorcycles), Some(&1));
        assert_eq!(counts.get(&Category::Rental), None);
    }

    #[test]
    fn replacing_with_nothing_clears_category() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage
            .replace_category(Category::Rental, &[listing("Hyundai", 20, Category::Rental)])
            .unwrap();
        storage.replace_category(Category::Rental, &[]).unwrap();
        assert!(storage.load_all().unwrap().is_empty());
    }

    #[test]
    fn keeps_the_latest_run() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.last_run(Category::Cars).unwrap(), None);

        let first = ScrapeRun { category: Category::Cars, pages: 1, listings: 10, finished_at: Utc::now() };
        let second = ScrapeRun { pages: 3, listings: 42, ..first.clone() };
        storage.record_run(&first).unwrap();
        storage.record_run(&second).unwrap();

        let last = storage.last_run(Category::Cars).unwrap().unwrap();
        assert_eq!(last.pages, 3);
        assert_eq!(last.listings, 42);
        assert_eq!(last.finished_at.timestamp(), second.finished_at.timestamp());
    }

    #[test]
    fn migration_is_idempotent() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        SqliteStorage::migrate_add_column_if_missing(&storage.conn, "listings", "scraped_at", "TEXT").unwrap();
        SqliteStorage::migrate_add_column_if_missing(&storage.conn, "listings", "source_url", "TEXT").unwrap();
        SqliteStorage::migrate_add_column_if_missing(&storage.conn, "listings", "source_url", "TEXT").unwrap();
    }
}
