//! CSV export for the duplicate table.
//!
//! One row per duplicate group, in the order the groups were surfaced:
//!
//! - `primary`: first member discovered
//! - `secondary`: second member discovered (empty if absent)
//! - `digest`: content digest, 32 lowercase hex characters
//! - `more_than_two`: whether the group has further members
//!
//! Export is an on-demand serialization of rows already collected by the
//! consumer; it is not a streaming responsibility of the pipeline.

use std::io;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::duplicates::DuplicateRow;

/// Errors that can occur during CSV export.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single CSV record.
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    primary: &'a str,
    secondary: &'a str,
    digest: &'a str,
    more_than_two: bool,
}

/// CSV formatter over collected duplicate rows.
pub struct CsvOutput<'a> {
    rows: &'a [DuplicateRow],
}

impl<'a> CsvOutput<'a> {
    /// Create a formatter for the given rows.
    #[must_use]
    pub fn new(rows: &'a [DuplicateRow]) -> Self {
        Self { rows }
    }

    /// Write the CSV table to the given writer.
    ///
    /// # Errors
    ///
    /// Returns [`CsvOutputError`] if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for row in self.rows {
            let primary = row.primary.to_string_lossy();
            let secondary = row
                .secondary
                .as_ref()
                .map(|p| p.to_string_lossy())
                .unwrap_or_default();

            csv_writer.serialize(CsvRecord {
                primary: primary.as_ref(),
                secondary: secondary.as_ref(),
                digest: &row.digest,
                more_than_two: row.more_than_two,
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write the CSV table to a file path.
    ///
    /// # Errors
    ///
    /// Returns [`CsvOutputError`] if the file cannot be created or written.
    pub fn write_path(&self, path: &Path) -> Result<(), CsvOutputError> {
        let file = std::fs::File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }

    /// Render the CSV table as a string.
    ///
    /// # Errors
    ///
    /// Returns [`CsvOutputError`] if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
