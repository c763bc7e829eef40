//! Cancellable deadline waits.
//!
//! Long waits (commitment maturation, inclusion polling) race a fixed deadline
//! against the shared shutdown signal instead of sleeping blindly.

use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{sleep_until, Instant};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Sleep until `deadline`, returning `Cancelled` if shutdown fires first.
pub async fn sleep_until_or_cancelled(
    deadline: Instant,
    shutdown: &mut broadcast::Receiver<()>,
) -> OrchestratorResult<()> {
    tokio::select! {
        _ = sleep_until(deadline) => Ok(()),
        signal = shutdown.recv() => match signal {
            // Coordinator dropped: nothing can cancel any more.
            Err(RecvError::Closed) => {
                sleep_until(deadline).await;
                Ok(())
            }
            _ => Err(OrchestratorError::Cancelled),
        },
    }
}

/// Sleep for `duration`, returning `Cancelled` if shutdown fires first.
pub async fn sleep_or_cancelled(
    duration: Duration,
    shutdown: &mut broadcast::Receiver<()>,
) -> OrchestratorResult<()> {
    sleep_until_or_cancelled(Instant::now() + duration, shutdown).await
}

/// Convert a wall-clock target (ms since epoch) into a monotonic deadline.
pub fn deadline_from_wall_clock(target_ms: u64, now_ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(target_ms.saturating_sub(now_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    #[tokio::test]
    async fn test_deadline_elapses() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let result = sleep_or_cancelled(Duration::from_millis(10), &mut rx).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_wait() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let started = std::time::Instant::now();
        let result = sleep_or_cancelled(Duration::from_secs(30), &mut rx).await;
        assert!(matches!(result, Err(OrchestratorError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_wall_clock_in_past_is_immediate() {
        let now = Instant::now();
        assert!(deadline_from_wall_clock(1_000, 5_000) <= now + Duration::from_millis(5));
    }
}
