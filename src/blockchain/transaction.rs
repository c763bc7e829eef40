//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build EIP-1559 transactions with a fresh fee quote and a padded gas estimate
//! - Sign locally and broadcast the raw envelope
//! - Monitor confirmations and surface reverts

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::fees::FeePolicy;

/// Inflate a gas estimate by `margin_percent` (120 = +20%).
pub fn apply_gas_margin(estimate: u64, margin_percent: u64) -> u64 {
    ((estimate as u128 * margin_percent as u128) / 100) as u64
}

/// Signs and submits transactions for a single wallet, one at a time.
#[derive(Clone)]
pub struct TxSender {
    client: BlockchainClient,
    wallet: Wallet,
    fees: FeePolicy,
    gas_margin_percent: u64,
}

impl TxSender {
    /// Create a new transaction sender.
    pub fn new(client: BlockchainClient, wallet: Wallet, fees: FeePolicy, gas_margin_percent: u64) -> Self {
        Self {
            client,
            wallet,
            fees,
            gas_margin_percent,
        }
    }

    /// Build a fully populated, unsigned transaction request.
    ///
    /// # Arguments
    /// * `to` - Destination address
    /// * `value` - Amount of native token to send
    /// * `data` - Call data (empty for simple transfers)
    pub async fn build(&self, to: Address, value: U256, data: Bytes) -> OrchestratorResult<TransactionRequest> {
        // Get current nonce from chain and sync wallet
        let chain_nonce = self.client.get_transaction_count(self.wallet.address()).await?;
        self.wallet.set_nonce(chain_nonce);

        // Each transaction gets its own quote; the head moves between submissions.
        let quote = self.fees.current_quote(&self.client).await?;

        let draft = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_value(value)
            .with_input(data);
        let estimate = self.client.estimate_gas(draft.clone()).await?;
        let gas_limit = apply_gas_margin(estimate, self.gas_margin_percent);

        let nonce = self.wallet.get_and_increment_nonce();

        tracing::debug!(
            to = %to,
            nonce = nonce,
            gas_estimate = estimate,
            gas_limit = gas_limit,
            %quote,
            "Transaction built"
        );

        Ok(draft
            .with_nonce(nonce)
            .with_chain_id(self.wallet.chain_id())
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(quote.max_fee_per_gas)
            .with_max_priority_fee_per_gas(quote.priority_fee))
    }

    /// Build, sign, broadcast, and wait for confirmation.
    ///
    /// A mined-but-reverted transaction maps to `TransactionReverted`.
    pub async fn send_and_confirm(&self, to: Address, value: U256, data: Bytes) -> OrchestratorResult<TxHash> {
        let request = self.build(to, value, data).await?;
        let signed = self.wallet.sign_transaction(request).await?;
        let tx_hash = self.client.send_raw_transaction(&signed.raw).await?;
        tracing::info!(tx_hash = %tx_hash, "Transaction broadcast");

        let timeout_secs = self.client.config().confirmation_timeout_secs;
        match self.wait_for_confirmation(tx_hash, timeout_secs).await? {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(tx_hash = %tx_hash, block_number, "Transaction confirmed");
                Ok(tx_hash)
            }
            ConfirmationStatus::Failed(reason) => {
                tracing::error!(tx_hash = %tx_hash, reason = %reason, "Transaction failed");
                Err(OrchestratorError::TransactionReverted {
                    tx_hash: tx_hash.to_string(),
                })
            }
            other => Err(BlockchainError::Rpc(format!("unexpected confirmation state {:?}", other)).into()),
        }
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for confirmation
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.client.confirmation_blocks().max(1);
        let timeout_duration = Duration::from_secs(timeout_secs);
        let poll_interval = Duration::from_millis(self.client.config().poll_interval_ms);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                // Get the receipt
                let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                // Check if transaction succeeded
                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(
                        "Transaction reverted".to_string(),
                    ));
                }

                // Get current block number
                let current_block = self.client.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block counts as the first confirmation.
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                tx_hash: tx_hash.to_string(),
                timeout_secs,
            }),
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Underlying RPC client.
    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_status() {
        let status = ConfirmationStatus::Confirming {
            current: 2,
            required: 3,
        };
        assert!(matches!(status, ConfirmationStatus::Confirming { .. }));

        let status = ConfirmationStatus::Confirmed { block_number: 100 };
        assert!(matches!(status, ConfirmationStatus::Confirmed { .. }));
    }

    #[test]
    fn test_gas_margin() {
        assert_eq!(apply_gas_margin(100_000, 120), 120_000);
        assert_eq!(apply_gas_margin(21_000, 100), 21_000);
        assert_eq!(apply_gas_margin(50_001, 120), 60_001);
    }
}
