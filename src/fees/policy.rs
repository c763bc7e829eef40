//! EIP-1559 fee quoting.
//!
//! `maxFeePerGas = baseFee * multiplier + priorityFee`, recomputed from the
//! chain head for every submission and never cached.

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::BlockchainError;
use crate::error::{OrchestratorError, OrchestratorResult};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Gas price parameters for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Base fee observed at the chain head, in wei.
    pub base_fee: u128,
    /// Priority fee (tip), in wei.
    pub priority_fee: u128,
    /// Computed max fee per gas, in wei.
    pub max_fee_per_gas: u128,
    /// Multiplier applied to the base fee.
    pub multiplier: u64,
}

impl FeeQuote {
    /// Worst-case cost of `gas` units at this quote.
    pub fn max_cost(&self, gas: u64) -> U256 {
        U256::from(self.max_fee_per_gas) * U256::from(gas)
    }
}

impl std::fmt::Display for FeeQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "base={} gwei x{} + tip={} gwei => max={} gwei",
            gwei(self.base_fee),
            self.multiplier,
            gwei(self.priority_fee),
            gwei(self.max_fee_per_gas)
        )
    }
}

/// Compute a fee quote.
///
/// Fails with `InvalidFeeParameters` when the multiplier is below 1 or the
/// result does not fit in 128 bits.
pub fn quote(base_fee: u128, multiplier: u64, priority_fee: u128) -> OrchestratorResult<FeeQuote> {
    if multiplier < 1 {
        return Err(OrchestratorError::InvalidFeeParameters(format!(
            "multiplier must be >= 1, got {}",
            multiplier
        )));
    }

    let max_fee_per_gas = base_fee
        .checked_mul(multiplier as u128)
        .and_then(|scaled| scaled.checked_add(priority_fee))
        .ok_or_else(|| {
            OrchestratorError::InvalidFeeParameters(format!(
                "max fee overflows: base={} multiplier={} priority={}",
                base_fee, multiplier, priority_fee
            ))
        })?;

    Ok(FeeQuote {
        base_fee,
        priority_fee,
        max_fee_per_gas,
        multiplier,
    })
}

/// Parse a decimal gwei string ("1.5") into wei.
pub fn parse_gwei(value: &str) -> OrchestratorResult<u128> {
    let wei: U256 = parse_units(value, "gwei")
        .map_err(|e| {
            OrchestratorError::InvalidFeeParameters(format!("invalid gwei amount '{}': {}", value, e))
        })?
        .into();
    u128::try_from(wei).map_err(|_| {
        OrchestratorError::InvalidFeeParameters(format!("gwei amount '{}' too large", value))
    })
}

/// Render wei as a gwei decimal string for logs.
pub fn gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei").unwrap_or_else(|_| format!("{}wei", wei))
}

/// Configured fee aggressiveness, applied to a freshly observed base fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    pub multiplier: u64,
    pub priority_fee: u128,
    /// Upper bound on the computed max fee, in wei.
    pub max_fee_cap: Option<u128>,
}

impl FeePolicy {
    pub fn new(multiplier: u64, priority_fee_gwei: &str, max_fee_cap_gwei: Option<u64>) -> OrchestratorResult<Self> {
        Ok(Self {
            multiplier,
            priority_fee: parse_gwei(priority_fee_gwei)?,
            max_fee_cap: max_fee_cap_gwei.map(|cap| cap as u128 * WEI_PER_GWEI),
        })
    }

    /// Quote against an already observed base fee, enforcing the cap.
    pub fn quote_for(&self, base_fee: u128) -> OrchestratorResult<FeeQuote> {
        let quote = quote(base_fee, self.multiplier, self.priority_fee)?;
        if let Some(cap) = self.max_fee_cap {
            if quote.max_fee_per_gas > cap {
                return Err(BlockchainError::GasPriceTooHigh {
                    current_gwei: (quote.max_fee_per_gas / WEI_PER_GWEI) as u64,
                    max_gwei: (cap / WEI_PER_GWEI) as u64,
                }
                .into());
            }
        }
        Ok(quote)
    }

    /// Fetch the head base fee and quote against it.
    pub async fn current_quote(&self, client: &BlockchainClient) -> OrchestratorResult<FeeQuote> {
        let base_fee = client.get_base_fee().await?;
        let quote = self.quote_for(base_fee)?;
        tracing::debug!(%quote, "Fee quote computed");
        Ok(quote)
    }
}
