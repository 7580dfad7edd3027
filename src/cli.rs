//! Command-line interface definitions.
//!
//! All CLI arguments and subcommands use the clap derive API, with global
//! options (verbosity, quiet, JSON errors) and a `scan` subcommand.
//!
//! # Example
//!
//! ```bash
//! # Scan a removable drive for duplicates
//! mediadupe scan /mnt/usb
//!
//! # Export the duplicate table as CSV
//! mediadupe scan /mnt/usb --export dupes.csv
//!
//! # Tune worker counts for a slow drive
//! mediadupe scan /mnt/usb --hash-workers 2 --batch-size 4
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Concurrent duplicate file finder for removable media.
///
/// mediadupe walks a directory tree, skips files whose size is unique,
/// hashes the rest (MD5), and reports groups of files with identical
/// content as they are discovered.
#[derive(Debug, Parser)]
#[command(name = "mediadupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and result rows
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory tree for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Write the duplicate table to a CSV file when the scan finishes
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Number of size-filter workers (default: half the logical cores)
    #[arg(long, value_name = "N")]
    pub filter_workers: Option<usize>,

    /// Number of hash workers (default: one per logical core)
    #[arg(long, value_name = "N")]
    pub hash_workers: Option<usize>,

    /// Maximum number of files digested per batch
    #[arg(long, value_name = "N", default_value = "16")]
    pub batch_size: usize,

    /// Seconds between progress refreshes and result polls
    #[arg(long, value_name = "SECS", default_value = "1.0")]
    pub poll_interval: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_scan_basic() {
        let cli = Cli::try_parse_from(["mediadupe", "scan", "/some/path"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);

        let Commands::Scan(args) = cli.command;
        assert_eq!(args.path, PathBuf::from("/some/path"));
        assert!(args.export.is_none());
        assert_eq!(args.batch_size, 16);
        assert!((args.poll_interval - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cli_parse_scan_with_options() {
        let cli = Cli::try_parse_from([
            "mediadupe",
            "-v",
            "scan",
            "/path",
            "--export",
            "out.csv",
            "--filter-workers",
            "2",
            "--hash-workers",
            "8",
            "--batch-size",
            "4",
            "--poll-interval",
            "0.5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);

        let Commands::Scan(args) = cli.command;
        assert_eq!(args.export, Some(PathBuf::from("out.csv")));
        assert_eq!(args.filter_workers, Some(2));
        assert_eq!(args.hash_workers, Some(8));
        assert_eq!(args.batch_size, 4);
        assert!((args.poll_interval - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["mediadupe", "-v", "-q", "scan", "/path"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_missing_path() {
        let result = Cli::try_parse_from(["mediadupe", "scan"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_invalid_subcommand() {
        let result = Cli::try_parse_from(["mediadupe", "invalid", "/path"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_json_errors_flag() {
        let cli =
            Cli::try_parse_from(["mediadupe", "--json-errors", "scan", "/path"]).unwrap();
        assert!(cli.json_errors);
    }

    #[test]
    fn test_cli_version_flag() {
        // clap exits early on --version, which try_parse_from reports as Err
        let result = Cli::try_parse_from(["mediadupe", "--version"]);
        assert!(result.is_err());
    }
}
