// CSV export of cleaned listings
use crate::model::{Category, ExportError, Listing};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column names as downstream spreadsheets already know them (including "adress").
pub const HEADER: [&str; 11] = [
    "brand", "model", "year", "ref", "km", "fuel", "gearbox", "price", "owner", "adress", "category",
];

pub const ALL_FILE_NAME: &str = "dakar_auto_scraped_all.csv";

pub fn category_file_name(category: Category) -> String {
    format!("{}_scraped.csv", category)
}

fn to_record(listing: &Listing) -> [String; 11] {
    [
        listing.brand.clone(),
        listing.model.clone(),
        listing.year.to_string(),
        listing.reference.clone(),
        listing.km.to_string(),
        listing.fuel.clone(),
        listing.gearbox.clone(),
        listing.price.to_string(),
        listing.owner.clone(),
        listing.address.clone(),
        listing.category.to_string(),
    ]
}

pub fn write_csv<W: Write>(listings: &[Listing], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for listing in listings {
        wtr.write_record(to_record(listing))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_file(listings: &[Listing], path: &Path) -> Result<PathBuf, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_csv(listings, File::create(path)?)?;
    info!("Wrote {} rows to {}", listings.len(), path.display());
    Ok(path.to_path_buf())
}
