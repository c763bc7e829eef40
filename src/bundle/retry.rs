//! Retry controller: resubmit across a bounded window of target blocks.

use crate::bundle::builder::BundleFactory;
use crate::bundle::relay::BundleRelay;
use crate::bundle::types::{Attempt, InclusionOutcome, RescueReport};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::lifecycle::Shutdown;

/// Makes up to `retry_blocks + 1` attempts, each targeting the block after
/// the head observed at submission time.
pub struct RetryController<F, R> {
    factory: F,
    relay: R,
    retry_blocks: u32,
    shutdown: Shutdown,
}

impl<F: BundleFactory, R: BundleRelay> RetryController<F, R> {
    pub fn new(factory: F, relay: R, retry_blocks: u32, shutdown: Shutdown) -> Self {
        Self {
            factory,
            relay,
            retry_blocks,
            shutdown,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_blocks.saturating_add(1)
    }

    pub fn relay(&self) -> &R {
        &self.relay
    }

    /// Run until the bundle lands.
    ///
    /// A failed simulation stops immediately with `SimulationFailed`;
    /// exhausting every attempt yields `BundleNotIncluded`. `on_attempt` sees
    /// each attempt as soon as its outcome is known.
    pub async fn run<C>(&self, mut on_attempt: C) -> OrchestratorResult<RescueReport>
    where
        C: FnMut(&Attempt) + Send,
    {
        let max_attempts = self.max_attempts();
        let mut report = RescueReport::default();
        let mut shutdown = self.shutdown.subscribe();

        for number in 1..=max_attempts {
            let head = self.factory.head_block().await?;
            let target_block = head + 1;
            let bundle = self.factory.build().await?;

            let simulation = self.relay.simulate(&bundle, target_block, head).await?;
            if let Some(error) = &simulation.error {
                tracing::error!(attempt = number, target_block, error = %error, "Bundle simulation failed");
                return Err(OrchestratorError::SimulationFailed(error.clone()));
            }
            tracing::info!(
                attempt = number,
                target_block,
                gas_used = simulation.total_gas_used,
                coinbase_diff_wei = %simulation.coinbase_diff,
                "Simulation ok"
            );

            let bundle_hash = self.relay.send(&bundle, target_block).await?;
            tracing::info!(
                attempt = number,
                max_attempts,
                target_block,
                quote = %bundle.quote,
                bundle_hash = bundle_hash.as_deref().unwrap_or("-"),
                "Bundle submitted"
            );

            let outcome = tokio::select! {
                outcome = self.relay.wait_for_inclusion(&bundle, target_block) => outcome?,
                _ = shutdown.recv() => return Err(OrchestratorError::Cancelled),
            };

            let attempt = Attempt {
                number,
                target_block,
                quote: bundle.quote,
                funding_wei: bundle.funding_value(),
                simulation,
                outcome,
            };
            on_attempt(&attempt);
            report.attempts.push(attempt);

            match outcome {
                InclusionOutcome::Included { block_number } => {
                    tracing::info!(attempt = number, block_number, "Bundle included");
                    return Ok(report);
                }
                other => tracing::warn!(attempt = number, target_block, outcome = %other, "Bundle not included"),
            }
        }

        tracing::error!(
            attempts = max_attempts,
            "Bundle not included; raise the priority fee or fee multiplier"
        );
        Err(OrchestratorError::BundleNotIncluded {
            attempts: max_attempts,
        })
    }
}
