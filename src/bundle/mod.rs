//! Atomic rescue bundle over a private relay.
//!
//! # Data Flow
//! ```text
//! rescue command
//!     → builder.rs (preflight, then a freshly signed 2-tx bundle per attempt)
//!     → retry.rs (target head+1, simulate, submit, await inclusion; N+1 attempts)
//!         → relay.rs (signed eth_callBundle / eth_sendBundle, inclusion check)
//! ```
//!
//! # Design Decisions
//! - Preflight failures abort before any transaction is signed
//! - Simulation failure is fatal; a non-included attempt moves to the next block
//! - The relay, not this crate, makes the two transactions atomic

pub mod builder;
pub mod relay;
pub mod retry;
pub mod types;

pub use builder::{required_funding, BundleFactory, RescueBundleBuilder, RescuePlan, FUNDING_GAS_LIMIT};
pub use relay::{BundleRelay, FlashbotsRelay};
pub use retry::RetryController;
pub use types::{Attempt, InclusionOutcome, RescueReport, SignedBundle, SimulationReport};

use alloy::primitives::Address;
use std::time::Duration;

use crate::blockchain::{BlockchainClient, Wallet};
use crate::config::OrchestratorConfig;
use crate::ens::{EnsContracts, EnsLabel};
use crate::error::OrchestratorResult;
use crate::lifecycle::Shutdown;

/// Keys taking part in a rescue.
#[derive(Debug, Clone)]
pub struct RescueKeys {
    pub funder: Wallet,
    pub holder: Wallet,
    /// Relay reputation key; usually the funder.
    pub relay_auth: Wallet,
}

/// Operator request for one rescue.
#[derive(Debug, Clone)]
pub struct RescueRequest {
    pub label: EnsLabel,
    pub new_owner: Address,
    /// Address that must currently own the token. Defaults to the holder key.
    pub expected_holder: Option<Address>,
    /// Overrides `rescue.relay_url`.
    pub relay_url: Option<String>,
}

/// Preflight, then run the retry loop. Nothing is signed or sent unless
/// preflight passes.
pub async fn run_rescue<C>(
    config: &OrchestratorConfig,
    keys: RescueKeys,
    request: RescueRequest,
    shutdown: Shutdown,
    on_attempt: C,
) -> OrchestratorResult<RescueReport>
where
    C: FnMut(&Attempt) + Send,
{
    let contracts = EnsContracts::from_config(&config.ens)?;
    let client = BlockchainClient::new(config.network.clone())?;

    let builder = RescueBundleBuilder::new(
        client.clone(),
        keys.funder,
        keys.holder,
        &contracts,
        &config.rescue,
        request.label,
        request.new_owner,
    )?;
    builder.preflight(&contracts, request.expected_holder).await?;

    let relay_url = request
        .relay_url
        .as_deref()
        .unwrap_or(&config.rescue.relay_url);
    let relay = FlashbotsRelay::new(
        relay_url,
        keys.relay_auth,
        client,
        config.retries.clone(),
        Duration::from_secs(config.rescue.inclusion_timeout_secs),
    )?;

    tracing::info!(
        relay = %relay_url,
        retry_blocks = config.rescue.retry_blocks,
        "Submitting rescue bundle"
    );
    RetryController::new(builder, relay, config.rescue.retry_blocks, shutdown)
        .run(on_attempt)
        .await
}
