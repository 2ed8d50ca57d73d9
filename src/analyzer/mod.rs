// Analyzer module: statistics behind the listings report.

pub mod market_indicators;
pub mod report;

pub use report::{Analyzer, AnalyzerImpl};
