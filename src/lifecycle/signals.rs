//! OS signal handling.
//!
//! SIGINT (Ctrl-C) triggers the shared [`Shutdown`]; a second one exits
//! immediately with the cancelled status.

use crate::error::CANCELLED_EXIT_CODE;
use crate::lifecycle::Shutdown;

/// Spawn a task that forwards Ctrl-C to `shutdown`.
pub fn spawn_interrupt_handler(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("Unable to listen for Ctrl-C; cancellation disabled");
            return;
        }
        tracing::warn!("Interrupt received, cancelling (press Ctrl-C again to force exit)");
        shutdown.trigger();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Second interrupt, exiting now");
            std::process::exit(CANCELLED_EXIT_CODE);
        }
    })
}
