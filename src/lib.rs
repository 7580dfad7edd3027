//! mediadupe - Concurrent duplicate file finder for removable media.
//!
//! Finds duplicate files by content using a cancellable multi-stage
//! pipeline: a directory enumerator feeds a size-bucket filter that only
//! forwards files whose size is shared, a pool of hash workers digests the
//! survivors (MD5), and a concurrency-safe duplicate index groups paths by
//! digest. Consumers poll snapshots and a progress record; they never see
//! the intermediate queues.

pub mod cli;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod signal;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::cli::{Cli, Commands, ScanArgs};
use crate::error::ExitCode;
use crate::output::CsvOutput;
use crate::progress::ConsoleReporter;
use crate::scanner::Md5Digester;
use crate::session::{Scanner, SessionConfig};
use crate::signal::ShutdownHandler;

/// How often the poll loop wakes to check for Ctrl+C between refreshes.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Run the application with parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for unexpected failures (e.g. the export file cannot
/// be written). Scan-level problems such as unreadable roots or vanished
/// files are logged and recovered, and surface only as "completed with no
/// duplicates".
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let handler = signal::install_handler()?;

    match cli.command {
        Commands::Scan(args) => run_scan(&args, &handler, cli.quiet),
    }
}

fn run_scan(
    args: &ScanArgs,
    handler: &ShutdownHandler,
    quiet: bool,
) -> anyhow::Result<ExitCode> {
    let mut config = SessionConfig::default().with_batch_size(args.batch_size);
    if let Some(workers) = args.filter_workers {
        config = config.with_filter_workers(workers);
    }
    if let Some(workers) = args.hash_workers {
        config = config.with_hash_workers(workers);
    }

    let poll_interval = Duration::from_secs_f64(args.poll_interval.max(0.1));

    let mut scanner = Scanner::new(Arc::new(Md5Digester::new()), config);
    scanner.start(&args.path);

    let mut feed = scanner
        .current()
        .context("scan failed to start")?
        .feed();
    let reporter = ConsoleReporter::new(quiet);
    let mut rows = Vec::new();

    // Poll loop: refresh the progress line and drain newly qualified
    // groups once per interval; check for Ctrl+C far more often.
    let mut last_poll = Instant::now()
        .checked_sub(poll_interval)
        .unwrap_or_else(Instant::now);
    let interrupted = loop {
        let Some(handle) = scanner.current() else {
            break false;
        };

        if handler.is_shutdown_requested() {
            break true;
        }

        let state = handle.state();
        if last_poll.elapsed() >= poll_interval || state.is_terminal() {
            for row in feed.poll_new() {
                reporter.print_row(&row);
                rows.push(row);
            }
            reporter.update(&handle.progress());
            last_poll = Instant::now();
        }

        if state.is_terminal() {
            break false;
        }

        thread::sleep(SHUTDOWN_POLL);
    };

    // Wind the session down: on interruption cancel and wait for every
    // worker to acknowledge; on completion just reap the watcher.
    if let Some(handle) = scanner.current_mut() {
        if interrupted {
            handle.cancel_and_wait();
        } else {
            handle.wait();
        }
    }

    // Final authoritative drain of groups that qualified before the end.
    for row in feed.poll_new() {
        reporter.print_row(&row);
        rows.push(row);
    }

    let progress = scanner
        .current()
        .context("scan handle missing after completion")?
        .progress();

    if let Some(export) = &args.export {
        CsvOutput::new(&rows)
            .write_path(export)
            .with_context(|| format!("Failed to write CSV to {}", export.display()))?;
        log::info!("Duplicate table written to {}", export.display());
    }

    reporter.finish(&progress);

    if interrupted {
        return Ok(ExitCode::Interrupted);
    }
    if rows.is_empty() {
        Ok(ExitCode::NoDuplicates)
    } else {
        Ok(ExitCode::Success)
    }
}
