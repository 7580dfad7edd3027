//! Console progress reporting using indicatif.
//!
//! The reporter owns a single spinner line that is refreshed once per
//! second from the [`ScanProgress`](crate::session::ScanProgress) record,
//! and prints each duplicate row above the line as its group qualifies.
//! In quiet mode nothing is drawn and rows go straight to stdout.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::duplicates::DuplicateRow;
use crate::session::ScanProgress;

/// Console reporter for a running scan.
pub struct ConsoleReporter {
    bar: Option<ProgressBar>,
}

impl ConsoleReporter {
    /// Create a reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress line is displayed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            None
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// Refresh the status line from the latest progress record.
    pub fn update(&self, progress: &ScanProgress) {
        if let Some(ref bar) = self.bar {
            bar.set_message(format!(
                "{} | {:.1}s | {} seen, {} hashed, {} duplicate groups",
                progress.state,
                progress.elapsed.as_secs_f64(),
                progress.files_seen,
                progress.files_hashed,
                progress.duplicate_groups
            ));
        }
    }

    /// Print one duplicate row above the status line.
    pub fn print_row(&self, row: &DuplicateRow) {
        let line = format_row(row);
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => println!("{}", line),
        }
    }

    /// Clear the status line and print a final summary.
    pub fn finish(&self, progress: &ScanProgress) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        log::info!(
            "Scan {}: {} duplicate groups in {:.1}s",
            progress.state,
            progress.duplicate_groups,
            progress.elapsed.as_secs_f64()
        );
    }
}

/// Render one row for the console: digest, primary, secondary, and a
/// trailing marker when the group has further members.
fn format_row(row: &DuplicateRow) -> String {
    let secondary = row
        .secondary
        .as_ref()
        .map_or_else(String::new, |p| p.display().to_string());
    let more = if row.more_than_two { " (+more)" } else { "" };
    format!(
        "{}  {}  {}{}",
        row.digest,
        row.primary.display(),
        secondary,
        more
    )
}
