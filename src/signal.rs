//! Signal handling for graceful shutdown.
//!
//! Ctrl+C raises a shared atomic flag; the application loop observes it
//! and cancels the running scan cooperatively. No stage is ever killed.
//!
//! # Example
//!
//! ```rust,no_run
//! use mediadupe::signal::install_handler;
//!
//! let handler = install_handler().expect("failed to install signal handler");
//! if handler.is_shutdown_requested() {
//!     // cancel the scan and exit with code 130
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C): 128 + signal number 2, Unix convention.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag raised when a termination signal is received.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Manually request a shutdown (used by tests and by the handler).
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Reset the flag so the process can run another scan.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C handler, or return the one already installed.
///
/// The ctrlc crate only allows one handler per process, so repeated calls
/// (tests running `run_app` in parallel) reuse the global handler with the
/// flag reset. If installation fails because something else claimed the
/// signal, an unhooked handler is returned; manual shutdown requests still
/// work.
///
/// # Errors
///
/// Currently infallible in practice; the `Result` is kept so callers
/// propagate installation problems if the fallback is ever removed.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = Arc::clone(&handler.flag);

    match ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cancelling scan...");
        let _ = std::io::stderr().flush();
    }) {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(_) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let fallback = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            fallback.reset();
            Ok(fallback.clone())
        }
    }
}
