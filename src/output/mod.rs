//! Output formatters for duplicate scan results.

pub mod csv;

pub use csv::CsvOutput;
