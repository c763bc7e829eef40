//! Bundle data types.

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::Deserialize;

use crate::fees::{gwei, FeeQuote};

/// Position of a transaction inside the rescue bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleRole {
    /// Operator pays the holder's gas.
    Funding,
    /// Holder moves the asset.
    Transfer,
}

/// One signed transaction in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleTransaction {
    pub role: BundleRole,
    pub signer: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub value: U256,
    pub hash: TxHash,
    pub raw: Bytes,
}

/// Ordered, signed transactions that must land in the same block.
///
/// Order is fixed at construction; the relay receives them as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBundle {
    pub transactions: Vec<BundleTransaction>,
    /// The single quote both transactions were priced with.
    pub quote: FeeQuote,
}

impl SignedBundle {
    pub fn raw_transactions(&self) -> Vec<Bytes> {
        self.transactions.iter().map(|tx| tx.raw.clone()).collect()
    }

    pub fn hashes(&self) -> Vec<TxHash> {
        self.transactions.iter().map(|tx| tx.hash).collect()
    }

    pub fn funding_value(&self) -> U256 {
        self.transactions
            .iter()
            .find(|tx| tx.role == BundleRole::Funding)
            .map(|tx| tx.value)
            .unwrap_or_default()
    }
}

/// Relay's prediction for a bundle (`eth_callBundle`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub total_gas_used: u64,
    /// Net payment to the block producer, in wei.
    pub coinbase_diff: U256,
    pub bundle_hash: Option<String>,
    /// First transaction-level error or revert.
    pub error: Option<String>,
}

impl SimulationReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            Some(error) => write!(f, "error: {}", error),
            None => write!(
                f,
                "ok, gas_used={}, coinbase_diff={} ETH",
                self.total_gas_used,
                format_ether(self.coinbase_diff)
            ),
        }
    }
}

/// What happened to a submitted bundle at its target block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InclusionOutcome {
    Included { block_number: u64 },
    /// Target block mined without the bundle.
    BlockPassed,
    /// A bundle nonce was consumed by another transaction.
    AccountNonceTooHigh,
    /// Target block not observed within the wait limit.
    TimedOut,
}

impl InclusionOutcome {
    pub fn is_included(&self) -> bool {
        matches!(self, Self::Included { .. })
    }
}

impl std::fmt::Display for InclusionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Included { block_number } => write!(f, "included in block {}", block_number),
            Self::BlockPassed => f.write_str("block passed without inclusion"),
            Self::AccountNonceTooHigh => f.write_str("account nonce too high"),
            Self::TimedOut => f.write_str("timed out waiting for target block"),
        }
    }
}

/// One iteration of the retry loop. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based.
    pub number: u32,
    pub target_block: u64,
    pub quote: FeeQuote,
    pub funding_wei: U256,
    pub simulation: SimulationReport,
    pub outcome: InclusionOutcome,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempt {} target={} max_fee={} gwei priority={} gwei fund={} ETH sim=[{}] -> {}",
            self.number,
            self.target_block,
            gwei(self.quote.max_fee_per_gas),
            gwei(self.quote.priority_fee),
            format_ether(self.funding_wei),
            self.simulation,
            self.outcome
        )
    }
}

/// Append-only attempt history of a rescue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescueReport {
    pub attempts: Vec<Attempt>,
}

impl RescueReport {
    pub fn included(&self) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.outcome.is_included())
    }
}

/// `eth_callBundle` result as returned by the relay.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallBundleResponse {
    #[serde(default)]
    pub bundle_hash: Option<String>,
    #[serde(default)]
    pub coinbase_diff: Option<String>,
    #[serde(default)]
    pub total_gas_used: Option<u64>,
    #[serde(default)]
    pub results: Vec<CallBundleTxResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallBundleTxResult {
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub revert: Option<String>,
}

impl From<CallBundleResponse> for SimulationReport {
    fn from(response: CallBundleResponse) -> Self {
        let error = response.results.iter().find_map(|r| {
            let reason = r.error.as_ref().or(r.revert.as_ref())?;
            Some(match &r.tx_hash {
                Some(hash) => format!("{}: {}", hash, reason),
                None => reason.clone(),
            })
        });
        Self {
            total_gas_used: response.total_gas_used.unwrap_or_default(),
            coinbase_diff: response
                .coinbase_diff
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            bundle_hash: response.bundle_hash,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_from_relay_response() {
        let json = serde_json::json!({
            "bundleHash": "0xabc",
            "coinbaseDiff": "1000000000000000",
            "totalGasUsed": 73000,
            "results": [
                { "txHash": "0x01", "gasUsed": 21000 },
                { "txHash": "0x02", "gasUsed": 52000 }
            ]
        });
        let report: SimulationReport = serde_json::from_value::<CallBundleResponse>(json).unwrap().into();
        assert!(report.is_ok());
        assert_eq!(report.total_gas_used, 73_000);
        assert_eq!(report.coinbase_diff, U256::from(1_000_000_000_000_000u64));
        assert!(report.to_string().contains("0.001"));
    }

    #[test]
    fn test_simulation_surfaces_revert() {
        let json = serde_json::json!({
            "results": [
                { "txHash": "0x01" },
                { "txHash": "0x02", "error": "execution reverted", "revert": "ERC721: caller is not token owner" }
            ]
        });
        let report: SimulationReport = serde_json::from_value::<CallBundleResponse>(json).unwrap().into();
        assert_eq!(report.error.as_deref(), Some("0x02: execution reverted"));
    }

    #[test]
    fn test_outcome_only_included_counts() {
        assert!(InclusionOutcome::Included { block_number: 5 }.is_included());
        assert!(!InclusionOutcome::BlockPassed.is_included());
        assert!(!InclusionOutcome::AccountNonceTooHigh.is_included());
        assert!(!InclusionOutcome::TimedOut.is_included());
    }
}
