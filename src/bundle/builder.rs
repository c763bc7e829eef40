//! Rescue bundle construction.
//!
//! Two transactions, strictly ordered:
//! 1. funder → holder, enough ETH for the transfer's gas plus a buffer
//! 2. holder → `safeTransferFrom(holder, new_owner, tokenId)` on the base registrar
//!
//! Both are priced from one fee quote taken per attempt.

use alloy::network::TransactionBuilder;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::blockchain::transaction::apply_gas_margin;
use crate::blockchain::{BlockchainClient, Wallet};
use crate::bundle::types::{BundleRole, BundleTransaction, SignedBundle};
use crate::config::RescueConfig;
use crate::ens::contracts::{EnsContracts, IBaseRegistrar};
use crate::ens::gateway::token_owner;
use crate::ens::label::EnsLabel;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::fees::{FeePolicy, FeeQuote};

/// Gas limit of a plain ETH transfer.
pub const FUNDING_GAS_LIMIT: u64 = 21_000;

/// Produces a fresh bundle per attempt and reports the chain head.
#[async_trait]
pub trait BundleFactory: Send + Sync {
    async fn head_block(&self) -> OrchestratorResult<u64>;

    /// Re-quote, re-read nonces and re-sign.
    async fn build(&self) -> OrchestratorResult<SignedBundle>;
}

/// What to move, from whom, to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescuePlan {
    pub label: EnsLabel,
    pub registrar: Address,
    pub holder: Address,
    pub new_owner: Address,
}

impl RescuePlan {
    pub fn transfer_calldata(&self) -> Bytes {
        IBaseRegistrar::safeTransferFromCall {
            from: self.holder,
            to: self.new_owner,
            tokenId: self.label.token_id(),
        }
        .abi_encode()
        .into()
    }
}

/// ETH the holder needs: the estimated transfer gas at the max fee, plus the buffer.
pub fn required_funding(transfer_gas_estimate: u64, max_fee_per_gas: u128, buffer: U256) -> U256 {
    U256::from(transfer_gas_estimate) * U256::from(max_fee_per_gas) + buffer
}

/// Unsigned requests for one attempt.
#[derive(Debug, Clone)]
pub struct BundleRequests {
    pub funding: TransactionRequest,
    pub transfer: TransactionRequest,
    pub funding_wei: U256,
    pub transfer_gas_limit: u64,
}

/// Inputs observed from the chain for one attempt.
#[derive(Debug, Clone, Copy)]
pub struct AttemptInputs {
    pub quote: FeeQuote,
    pub funder: Address,
    pub funder_nonce: u64,
    pub holder_nonce: u64,
    pub transfer_gas_estimate: u64,
    pub chain_id: u64,
}

/// Assemble both requests from already observed inputs.
pub fn assemble(
    plan: &RescuePlan,
    inputs: &AttemptInputs,
    gas_margin_percent: u64,
    buffer: U256,
) -> BundleRequests {
    let transfer_gas_limit = apply_gas_margin(inputs.transfer_gas_estimate, gas_margin_percent);
    // Funded from the raw estimate; the margin only raises the limit.
    let funding_wei = required_funding(inputs.transfer_gas_estimate, inputs.quote.max_fee_per_gas, buffer);

    let funding = TransactionRequest::default()
        .with_from(inputs.funder)
        .with_to(plan.holder)
        .with_value(funding_wei)
        .with_nonce(inputs.funder_nonce)
        .with_chain_id(inputs.chain_id)
        .with_gas_limit(FUNDING_GAS_LIMIT)
        .with_max_fee_per_gas(inputs.quote.max_fee_per_gas)
        .with_max_priority_fee_per_gas(inputs.quote.priority_fee);

    let transfer = TransactionRequest::default()
        .with_from(plan.holder)
        .with_to(plan.registrar)
        .with_input(plan.transfer_calldata())
        .with_nonce(inputs.holder_nonce)
        .with_chain_id(inputs.chain_id)
        .with_gas_limit(transfer_gas_limit)
        .with_max_fee_per_gas(inputs.quote.max_fee_per_gas)
        .with_max_priority_fee_per_gas(inputs.quote.priority_fee);

    BundleRequests {
        funding,
        transfer,
        funding_wei,
        transfer_gas_limit,
    }
}

/// Sign assembled requests in bundle order.
pub async fn sign_bundle(
    requests: BundleRequests,
    inputs: &AttemptInputs,
    funder: &Wallet,
    holder: &Wallet,
) -> OrchestratorResult<SignedBundle> {
    let funding = funder.sign_transaction(requests.funding).await?;
    let transfer = holder.sign_transaction(requests.transfer).await?;

    Ok(SignedBundle {
        transactions: vec![
            BundleTransaction {
                role: BundleRole::Funding,
                signer: funder.address(),
                nonce: inputs.funder_nonce,
                gas_limit: FUNDING_GAS_LIMIT,
                value: requests.funding_wei,
                hash: funding.hash,
                raw: funding.raw,
            },
            BundleTransaction {
                role: BundleRole::Transfer,
                signer: holder.address(),
                nonce: inputs.holder_nonce,
                gas_limit: requests.transfer_gas_limit,
                value: U256::ZERO,
                hash: transfer.hash,
                raw: transfer.raw,
            },
        ],
        quote: inputs.quote,
    })
}

/// Builds the rescue bundle against a live chain.
pub struct RescueBundleBuilder {
    client: BlockchainClient,
    funder: Wallet,
    holder: Wallet,
    fees: FeePolicy,
    fund_buffer: U256,
    gas_margin_percent: u64,
    plan: RescuePlan,
}

impl RescueBundleBuilder {
    pub fn new(
        client: BlockchainClient,
        funder: Wallet,
        holder: Wallet,
        contracts: &EnsContracts,
        config: &RescueConfig,
        label: EnsLabel,
        new_owner: Address,
    ) -> OrchestratorResult<Self> {
        let fees = FeePolicy::new(config.fee_multiplier, &config.priority_fee_gwei, None)?;
        let fund_buffer = parse_ether(&config.fund_buffer_eth).map_err(|e| {
            OrchestratorError::InvalidFeeParameters(format!(
                "fund buffer '{}': {}",
                config.fund_buffer_eth, e
            ))
        })?;
        let plan = RescuePlan {
            label,
            registrar: contracts.base_registrar,
            holder: holder.address(),
            new_owner,
        };
        Ok(Self {
            client,
            funder,
            holder,
            fees,
            fund_buffer,
            gas_margin_percent: config.transfer_gas_margin_percent,
            plan,
        })
    }

    pub fn plan(&self) -> &RescuePlan {
        &self.plan
    }

    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }

    /// Checks that must pass before anything is signed.
    ///
    /// `expected_holder` defaults to the holder key's address.
    pub async fn preflight(
        &self,
        contracts: &EnsContracts,
        expected_holder: Option<Address>,
    ) -> OrchestratorResult<()> {
        let expected_chain = self.client.config().chain_id;
        let actual_chain = self.client.get_chain_id().await?.0;
        if actual_chain != expected_chain {
            return Err(OrchestratorError::PreconditionFailed(format!(
                "endpoint is on chain {}, expected {}",
                actual_chain, expected_chain
            )));
        }

        let expected_holder = expected_holder.unwrap_or(self.plan.holder);
        if expected_holder != self.plan.holder {
            return Err(OrchestratorError::PreconditionFailed(format!(
                "holder key controls {}, but the expected holder is {}",
                self.plan.holder, expected_holder
            )));
        }

        let owner = token_owner(&self.client, contracts, &self.plan.label).await?;
        if owner != expected_holder {
            return Err(OrchestratorError::OwnershipConflict {
                subject: format!("{} (token {})", self.plan.label, self.plan.label.token_id()),
                expected: expected_holder,
                actual: owner,
            });
        }

        if self.plan.new_owner == Address::ZERO || self.plan.new_owner == self.plan.holder {
            return Err(OrchestratorError::PreconditionFailed(format!(
                "new owner {} must differ from the holder and be non-zero",
                self.plan.new_owner
            )));
        }

        let inputs = self.observe().await?;
        let requests = assemble(&self.plan, &inputs, self.gas_margin_percent, self.fund_buffer);
        let needed = requests.funding_wei + inputs.quote.max_cost(FUNDING_GAS_LIMIT);
        let balance = self.client.get_balance(self.funder.address()).await?;
        if balance < needed {
            return Err(OrchestratorError::PreconditionFailed(format!(
                "funder {} holds {} ETH, needs {} ETH",
                self.funder.address(),
                format_ether(balance),
                format_ether(needed)
            )));
        }

        tracing::info!(
            label = %self.plan.label,
            token_id = %self.plan.label.token_id(),
            holder = %self.plan.holder,
            new_owner = %self.plan.new_owner,
            funder = %self.funder.address(),
            funder_balance_eth = %format_ether(balance),
            transfer_gas_estimate = inputs.transfer_gas_estimate,
            quote = %inputs.quote,
            "Preflight passed"
        );
        Ok(())
    }

    async fn observe(&self) -> OrchestratorResult<AttemptInputs> {
        let quote = self.fees.current_quote(&self.client).await?;
        let funder_nonce = self.client.get_transaction_count(self.funder.address()).await?;
        let holder_nonce = self.client.get_transaction_count(self.plan.holder).await?;

        let estimate_request = TransactionRequest::default()
            .with_from(self.plan.holder)
            .with_to(self.plan.registrar)
            .with_input(self.plan.transfer_calldata());
        let transfer_gas_estimate = self.client.estimate_gas(estimate_request).await?;

        Ok(AttemptInputs {
            quote,
            funder: self.funder.address(),
            funder_nonce,
            holder_nonce,
            transfer_gas_estimate,
            chain_id: self.client.config().chain_id,
        })
    }
}

#[async_trait]
impl BundleFactory for RescueBundleBuilder {
    async fn head_block(&self) -> OrchestratorResult<u64> {
        Ok(self.client.get_block_number().await?)
    }

    async fn build(&self) -> OrchestratorResult<SignedBundle> {
        let inputs = self.observe().await?;
        let requests = assemble(&self.plan, &inputs, self.gas_margin_percent, self.fund_buffer);
        tracing::debug!(
            funder_nonce = inputs.funder_nonce,
            holder_nonce = inputs.holder_nonce,
            transfer_gas_limit = requests.transfer_gas_limit,
            fund_eth = %format_ether(requests.funding_wei),
            "Bundle assembled"
        );
        sign_bundle(requests, &inputs, &self.funder, &self.holder).await
    }
}
