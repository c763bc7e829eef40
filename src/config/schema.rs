//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.
//! Private keys are never part of the schema; they are read from the
//! environment by [`crate::blockchain::Wallet::from_env`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// JSON-RPC endpoint settings.
    pub network: NetworkConfig,

    /// Fee policy for ordinary (public mempool) transactions.
    pub fees: FeeConfig,

    /// ENS contract addresses.
    pub ens: EnsConfig,

    /// Commitment store location.
    pub store: StoreConfig,

    /// Private bundle (rescue) settings.
    pub rescue: RescueConfig,

    /// Relay submission retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL. Empty means "must come from the environment".
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a transaction receipt, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            chain_id: 1,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 600,
            poll_interval_ms: 2000,
        }
    }
}

/// Fee policy configuration.
///
/// `maxFeePerGas = baseFee * multiplier + priorityFee`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Integer multiplier applied to the observed base fee (>= 1).
    pub multiplier: u64,

    /// Priority fee (tip) in gwei, decimal string (e.g. "1.5").
    pub priority_fee_gwei: String,

    /// Maximum fee per gas in gwei (protection against spikes).
    pub max_fee_per_gas_gwei: u64,

    /// Gas limit margin in percent over the node's estimate (120 = +20%).
    pub gas_limit_margin_percent: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            multiplier: 2,
            priority_fee_gwei: "1.5".to_string(),
            max_fee_per_gas_gwei: 500,
            gas_limit_margin_percent: 120,
        }
    }
}

/// ENS deployment addresses (mainnet defaults).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnsConfig {
    pub registry: String,
    pub registrar_controller: String,
    pub public_resolver: String,
    pub name_wrapper: String,
    pub base_registrar: String,
}

impl Default for EnsConfig {
    fn default() -> Self {
        Self {
            registry: "0x00000000000c2e074ec69a0dfb2997ba6c7d2e1e".to_string(),
            registrar_controller: "0x253553366da8546fc250f225fe3d25d0c782303b".to_string(),
            public_resolver: "0x231b0ee14048e9dccd1d247744d114a4eb5e8e63".to_string(),
            name_wrapper: "0xd4416b13d2b3a9abae7acd5d6c2bbdbe25686401".to_string(),
            base_registrar: "0x57f1887a8bf19b14fc0df6fd9b2acc9af147ea85".to_string(),
        }
    }
}

/// Commitment store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one record per label.
    /// Defaults to `$HOME/.config/ens-orchestrator/commitments`.
    pub dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the effective store directory.
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        dirs::home_dir()
            .map(|home| home.join(".config").join("ens-orchestrator").join("commitments"))
            .unwrap_or_else(|| PathBuf::from(".ens-orchestrator").join("commitments"))
    }
}

/// Private bundle (rescue) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RescueConfig {
    /// Private relay endpoint.
    pub relay_url: String,

    /// Base fee multiplier for bundle transactions.
    pub fee_multiplier: u64,

    /// Priority fee in gwei for bundle transactions.
    pub priority_fee_gwei: String,

    /// Extra target blocks to try after the first (N in N+1 attempts).
    pub retry_blocks: u32,

    /// Fixed safety buffer added to the funding transfer, in ETH.
    pub fund_buffer_eth: String,

    /// Gas limit inflation for the asset transfer in percent (120 = +20%).
    pub transfer_gas_margin_percent: u64,

    /// Maximum time to wait for a target block to be mined, in seconds.
    pub inclusion_timeout_secs: u64,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            relay_url: "https://relay.flashbots.net".to_string(),
            fee_multiplier: 2,
            priority_fee_gwei: "20".to_string(),
            retry_blocks: 8,
            fund_buffer_eth: "0.003".to_string(),
            transfer_gas_margin_percent: 120,
            inclusion_timeout_secs: 60,
        }
    }
}

/// Retry configuration for transient relay transport failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per relay request.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
