pub mod dakar_parser;

pub use dakar_parser::{DakarAutoParser, Parser};
