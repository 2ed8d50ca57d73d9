use crate::model::{Category, Listing, RawListing, UNKNOWN, UNKNOWN_YEAR};
use crate::utils::digits_only;
use std::collections::HashSet;

/// Normalizes every record and drops exact duplicate rows, keeping first occurrences.
pub fn clean(raws: &[RawListing], category: Category) -> Vec<Listing> {
    dedup(raws.iter().map(|raw| normalize(raw, category)).collect())
}

pub fn dedup(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.clone()))
        .collect()
}

pub fn normalize(raw: &RawListing, category: Category) -> Listing {
    Listing {
        brand: text_or_unknown(raw.brand.as_deref()),
        model: text_or_unknown(raw.model.as_deref()),
        year: parse_year(raw.year.as_deref()),
        reference: text_or_unknown(raw.reference.as_deref()),
        km: parse_amount(raw.km.as_deref()),
        fuel: text_or_unknown(raw.fuel.as_deref()),
        gearbox: text_or_unknown(raw.gearbox.as_deref()),
        price: parse_amount(raw.price.as_deref()),
        owner: text_or_unknown(raw.owner.as_deref()),
        address: text_or_unknown(raw.address.as_deref()),
        category,
    }
}

fn text_or_unknown(value: Option<&str>) -> String {
    let value = value.map(str::trim).unwrap_or("");
    if value.is_empty() || value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("nan") {
        UNKNOWN.to_string()
    } else {
        value.to_string()
    }
}

fn parse_year(value: Option<&str>) -> i32 {
    value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(UNKNOWN_YEAR)
}

/// Digits only, so "25 000 000" and "85.000" both parse; anything else is 0.
fn parse_amount(value: Option<&str>) -> i64 {
    value
        .map(digits_only)
        .and_then(|digits| digits.parse::<i64>().ok())
        .unwrap_or(0)
}
