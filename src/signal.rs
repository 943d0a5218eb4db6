//! Cancellation and Ctrl+C handling.
//!
//! A [`CancelToken`] wraps a shared `AtomicBool`. The walker loop and the
//! quarantine mover poll it between files; setting it never interrupts a
//! move that is already in flight.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dupedoctor::signal::install_handler;
//!
//! let token = install_handler().expect("Failed to install signal handler");
//!
//! // Hand clones to the finder and the mover
//! let worker_token = token.clone();
//! if worker_token.is_cancelled() {
//!     println!("Cancelled, stopping after the current file");
//! }
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared cooperative cancellation flag.
///
/// Clones observe the same flag. `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next check point.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused.
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

static GLOBAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Install a Ctrl+C handler that cancels the returned token.
///
/// Repeated calls in one process (tests calling `run_app` in parallel)
/// reset and return the token registered first. If another component already
/// owns the Ctrl+C hook, an unhooked token is returned instead; it still
/// supports manual [`CancelToken::cancel`].
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// installation failure should be fatal.
pub fn install_handler() -> Result<CancelToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    let hook = token.clone();

    match ctrlc::set_handler(move || {
        hook.cancel();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing current file...");
        let _ = std::io::stderr().flush();
        log::info!("Cancellation signal received");
    }) {
        Ok(()) => {
            let _ = GLOBAL_TOKEN.set(token.clone());
            Ok(token)
        }
        Err(e) => {
            if let Some(existing) = GLOBAL_TOKEN.get() {
                existing.reset();
                return Ok(existing.clone());
            }
            log::debug!("Ctrl+C handler unavailable ({e}), using unhooked token");
            let fallback = CancelToken::new();
            let _ = GLOBAL_TOKEN.set(fallback.clone());
            Ok(fallback)
        }
    }
}
