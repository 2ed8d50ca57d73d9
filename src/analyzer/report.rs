use crate::analyzer::market_indicators::{BoxStats, GroupCount, HistogramBin, MarketAnalyzer, NumericSummary};
use crate::model::{Listing, UNKNOWN, UNKNOWN_YEAR};
use serde::Serialize;
use std::fmt;

pub const PRICE_BINS: usize = 30;
pub const YEAR_BINS: usize = 20;
pub const TOP_BRANDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub name: String,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBox {
    pub name: String,
    pub stats: BoxStats,
}

/// Everything the dashboard used to chart, computed over one set of listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    pub rows: usize,
    pub columns: usize,
    pub unknown_values: Vec<GroupCount>,
    pub price: Option<NumericSummary>,
    pub km: Option<NumericSummary>,
    pub year: Option<NumericSummary>,
    pub by_category: Vec<GroupCount>,
    pub by_brand: Vec<GroupCount>,
    pub top_brands: Vec<GroupCount>,
    pub mean_price_by_brand: Vec<GroupMean>,
    pub price_histogram: Vec<HistogramBin>,
    pub year_histogram: Vec<HistogramBin>,
    pub price_by_category: Vec<GroupBox>,
    pub price_by_top_brand: Vec<GroupBox>,
    pub price_km_correlation: Option<f64>,
}

impl DatasetReport {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

pub trait Analyzer {
    fn build_report(&self, listings: &[Listing]) -> DatasetReport;
}

pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

fn known_price(l: &Listing) -> Option<f64> {
    (l.price > 0).then_some(l.price as f64)
}

fn known_km(l: &Listing) -> Option<f64> {
    (l.km > 0).then_some(l.km as f64)
}

fn known_year(l: &Listing) -> Option<f64> {
    (l.year != UNKNOWN_YEAR).then_some(l.year as f64)
}

fn unknown_values(listings: &[Listing]) -> Vec<GroupCount> {
    let text = |f: fn(&Listing) -> &str| listings.iter().filter(|l| f(*l) == UNKNOWN).count();
    let columns = [
        ("brand", text(|l| l.brand.as_str())),
        ("model", text(|l| l.model.as_str())),
        ("year", listings.iter().filter(|l| known_year(l).is_none()).count()),
        ("ref", text(|l| l.reference.as_str())),
        ("km", listings.iter().filter(|l| known_km(l).is_none()).count()),
        ("fuel", text(|l| l.fuel.as_str())),
        ("gearbox", text(|l| l.gearbox.as_str())),
        ("price", listings.iter().filter(|l| known_price(l).is_none()).count()),
        ("owner", text(|l| l.owner.as_str())),
        ("adress", text(|l| l.address.as_str())),
        ("category", 0),
    ];
    columns
        .into_iter()
        .map(|(name, count)| GroupCount { name: name.to_string(), count })
        .collect()
}

fn to_group_counts<K: ToString>(counts: Vec<(K, usize)>) -> Vec<GroupCount> {
    counts
        .into_iter()
        .map(|(k, count)| GroupCount { name: k.to_string(), count })
        .collect()
}

fn price_boxes<'a, I>(pairs: I) -> Vec<GroupBox>
where
    I: IntoIterator<Item = (String, &'a Listing)>,
{
    let values = pairs
        .into_iter()
        .filter_map(|(name, l)| known_price(l).map(|p| (name, p)));
    MarketAnalyzer::group_values(values)
        .into_iter()
        .filter_map(|(name, prices)| MarketAnalyzer::box_stats(&prices).map(|stats| GroupBox { name, stats }))
        .collect()
}

impl Analyzer for AnalyzerImpl {
    fn build_report(&self, listings: &[Listing]) -> DatasetReport {
        let prices: Vec<f64> = listings.iter().filter_map(known_price).collect();
        let kms: Vec<f64> = listings.iter().filter_map(known_km).collect();
        let years: Vec<f64> = listings.iter().filter_map(known_year).collect();

        let by_brand = to_group_counts(MarketAnalyzer::count_by(listings.iter().map(|l| l.brand.as_str())));
        let top_brands: Vec<GroupCount> = by_brand.iter().take(TOP_BRANDS).cloned().collect();

        let mut mean_price_by_brand: Vec<GroupMean> = MarketAnalyzer::group_values(
            listings
                .iter()
                .filter_map(|l| known_price(l).map(|p| (l.brand.as_str(), p))),
        )
        .into_iter()
        .map(|(brand, prices)| GroupMean { name: brand.to_string(), mean: MarketAnalyzer::mean(&prices) })
        .collect();
        mean_price_by_brand.sort_by(|a, b| b.mean.total_cmp(&a.mean).then_with(|| a.name.cmp(&b.name)));

        let price_by_category = price_boxes(listings.iter().map(|l| (l.category.to_string(), l)));
        let price_by_top_brand = price_boxes(
            listings
                .iter()
                .filter(|l| top_brands.iter().any(|b| b.name == l.brand))
                .map(|l| (l.brand.clone(), l)),
        );

        let (corr_price, corr_km): (Vec<f64>, Vec<f64>) = listings
            .iter()
            .filter_map(|l| Some((known_price(l)?, known_km(l)?)))
            .unzip();

        DatasetReport {
            rows: listings.len(),
            columns: Listing::COLUMNS,
            unknown_values: unknown_values(listings),
            price: MarketAnalyzer::describe(&prices),
            km: MarketAnalyzer::describe(&kms),
            year: MarketAnalyzer::describe(&years),
            by_category: to_group_counts(MarketAnalyzer::count_by(listings.iter().map(|l| l.category))),
            by_brand,
            top_brands,
            mean_price_by_brand,
            price_histogram: MarketAnalyzer::histogram(&prices, PRICE_BINS),
            year_histogram: MarketAnalyzer::histogram(&years, YEAR_BINS),
            price_by_category,
            price_by_top_brand,
            price_km_correlation: MarketAnalyzer::compute_correlation(&corr_km, &corr_price),
        }
    }
}

fn write_summary(f: &mut fmt::Formatter<'_>, name: &str, summary: &Option<NumericSummary>) -> fmt::Result {
    match summary {
        Some(s) => writeln!(
            f,
            "  {:<6} count={} mean={:.1} std={:.1} min={:.0} 25%={:.0} 50%={:.0} 75%={:.0} max={:.0}",
            name, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        ),
        None => writeln!(f, "  {:<6} no known values", name),
    }
}

fn write_boxes(f: &mut fmt::Formatter<'_>, title: &str, boxes: &[GroupBox]) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    for b in boxes {
        writeln!(
            f,
            "  {:<20} n={:<5} min={:.0} q1={:.0} median={:.0} q3={:.0} max={:.0}",
            b.name, b.stats.count, b.stats.min, b.stats.q1, b.stats.median, b.stats.q3, b.stats.max
        )?;
    }
    Ok(())
}

fn write_histogram(f: &mut fmt::Formatter<'_>, title: &str, bins: &[HistogramBin]) -> fmt::Result {
    writeln!(f, "{}:", title)?;
    let peak = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for b in bins {
        let bar = "#".repeat((b.count * 40).div_ceil(peak));
        writeln!(f, "  {:>12.0} - {:<12.0} {:>5} {}", b.lower, b.upper, b.count, bar)?;
    }
    Ok(())
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No data available. Run the scrape first.");
        }

        writeln!(f, "Dataset: {} rows, {} columns", self.rows, self.columns)?;
        writeln!(f)?;
        writeln!(f, "Unknown values per column:")?;
        for c in &self.unknown_values {
            writeln!(f, "  {:<10} {}", c.name, c.count)?;
        }
        writeln!(f)?;
        writeln!(f, "Descriptive statistics (known values only):")?;
        write_summary(f, "price", &self.price)?;
        write_summary(f, "km", &self.km)?;
        write_summary(f, "year", &self.year)?;
        writeln!(f)?;
        writeln!(f, "Listings per category:")?;
        for c in &self.by_category {
            writeln!(f, "  {:<12} {:>6} ({:.1}%)", c.name, c.count, 100.0 * c.count as f64 / self.rows as f64)?;
        }
        writeln!(f)?;
        writeln!(f, "Top {} brands:", TOP_BRANDS)?;
        for c in &self.top_brands {
            writeln!(f, "  {:<20} {}", c.name, c.count)?;
        }
        writeln!(f, "  ({} distinct brands)", self.by_brand.len())?;
        writeln!(f)?;
        writeln!(f, "Mean price per brand:")?;
        for m in &self.mean_price_by_brand {
            writeln!(f, "  {:<20} {:.0}", m.name, m.mean)?;
        }
        writeln!(f)?;
        write_boxes(f, "Price by category", &self.price_by_category)?;
        writeln!(f)?;
        write_boxes(f, "Price by brand (top 10)", &self.price_by_top_brand)?;
        writeln!(f)?;
        write_histogram(f, "Price distribution", &self.price_histogram)?;
        writeln!(f)?;
        write_histogram(f, "Year distribution", &self.year_histogram)?;
        writeln!(f)?;
        match self.price_km_correlation {
            Some(r) => writeln!(f, "Price vs km correlation: {:.3}", r),
            None => writeln!(f, "Price vs km correlation: n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    fn listing(brand: &str, year: i32, km: i64, price: i64, category: Category) -> Listing {
        Listing {
            brand: brand.into(),
            model: UNKNOWN.into(),
            year,
            reference: "1".into(),
            km,
            fuel: "Diesel".into(),
            gearbox: UNKNOWN.into(),
            price,
            owner: "Garage".into(),
            address: "Dakar".into(),
            category,
        }
    }

    fn sample() -> Vec<Listing> {
        vec![
            listing("Toyota", 2018, 50_000, 10_000_000, Category::Cars),
            listing("Toyota", 2015, 120_000, 6_000_000, Category::Cars),
            listing("Kia", -1, 0, 0, Category::Rental),
            listing("Yamaha", 2021, 200_000, 900_000, Category::Motorcycles),
        ]
    }

    #[test]
    fn empty_report_says_so() {
        let report = AnalyzerImpl::new().build_report(&[]);
        assert!(report.is_empty());
        assert!(report.price.is_none());
        assert_eq!(report.to_string(), "No data available. Run the scrape first.\n");
    }

    #[test]
    fn counts_and_unknowns() {
        let report = AnalyzerImpl::new().build_report(&sample());
        assert_eq!(report.rows, 4);
        assert_eq!(report.columns, 11);

        let unknown = |name: &str| report.unknown_values.iter().find(|c| c.name == name).unwrap().count;
        assert_eq!(unknown("model"), 4);
        assert_eq!(unknown("gearbox"), 4);
        assert_eq!(unknown("year"), 1);
        assert_eq!(unknown("price"), 1);
        assert_eq!(unknown("owner"), 0);

        assert_eq!(report.by_category[0], GroupCount { name: "cars".into(), count: 2 });
        assert_eq!(report.top_brands[0], GroupCount { name: "Toyota".into(), count: 2 });
        assert_eq!(report.by_brand.len(), 3);
    }

    #[test]
    fn unknown_sentinels_are_excluded_from_statistics() {
        let report = AnalyzerImpl::new().build_report(&sample());
        let price = report.price.unwrap();
        assert_eq!(price.count, 3);
        assert_eq!(price.min, 900_000.0);
        assert_eq!(report.year.unwrap().count, 3);
        assert_eq!(report.price_histogram.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(report.price_histogram.len(), PRICE_BINS);
    }

    #[test]
    fn mean_price_per_brand_is_descending() {
        let report = AnalyzerImpl::new().build_report(&sample());
        let names: Vec<_> = report.mean_price_by_brand.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Toyota", "Yamaha"]);
        assert_eq!(report.mean_price_by_brand[0].mean, 8_000_000.0);
    }

    #[test]
    fn box_stats_per_category() {
        let report = AnalyzerImpl::new().build_report(&sample());
        let cars = report.price_by_category.iter().find(|b| b.name == "cars").unwrap();
        assert_eq!(cars.stats.count, 2);
        assert_eq!(cars.stats.median, 8_000_000.0);
        assert!(report.price_by_category.iter().all(|b| b.name != "rental"));
    }

    #[test]
    fn cheaper_with_more_km() {
        let report = AnalyzerImpl::new().build_report(&sample());
        assert!(report.price_km_correlation.unwrap() < 0.0);
    }

    #[test]
    fn text_and_json_render() {
        let report = AnalyzerImpl::new().build_report(&sample());
        let text = report.to_string();
        assert!(text.contains("Dataset: 4 rows, 11 columns"));
        assert!(text.contains("Toyota"));

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"], 4);
        assert_eq!(json["by_category"][0]["name"], "cars");
    }
}
