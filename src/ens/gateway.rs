//! On-chain access for the commit-reveal flow.
//!
//! [`RegistrarGateway`] is the seam between the scheduler and the chain. The
//! production [`EnsGateway`] issues `eth_call` reads through the
//! [`BlockchainClient`] and sends transactions through a [`TxSender`]; tests
//! substitute an in-memory implementation.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::blockchain::{BlockchainClient, BlockchainError, TxSender};
use crate::ens::contracts::{
    CommitmentParams, EnsContracts, IBaseRegistrar, IEnsRegistry, INameWrapper, IPublicResolver,
    IRegistrarController, COIN_TYPE_ETH,
};
use crate::ens::label::EnsLabel;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Reads and writes against the ENS registrar stack.
///
/// Write methods return once the transaction is confirmed.
#[async_trait]
pub trait RegistrarGateway: Send + Sync {
    /// Minimum commitment age in seconds.
    async fn min_commitment_age(&self) -> OrchestratorResult<u64>;

    async fn available(&self, label: &EnsLabel) -> OrchestratorResult<bool>;

    /// Effective owner of the name, unwrapping NameWrapper custody.
    /// `Address::ZERO` when the node has no owner.
    async fn owner(&self, label: &EnsLabel) -> OrchestratorResult<Address>;

    /// Total rent (base + premium) in wei.
    async fn rent_price(&self, label: &EnsLabel, duration_secs: u64) -> OrchestratorResult<U256>;

    /// Commitment hash as computed by the controller.
    async fn make_commitment(&self, params: &CommitmentParams) -> OrchestratorResult<B256>;

    async fn commit(&self, commitment: B256) -> OrchestratorResult<TxHash>;

    async fn register(&self, params: &CommitmentParams, value: U256) -> OrchestratorResult<TxHash>;

    /// Gas estimate for `register`; reverts when no matured commitment exists.
    async fn estimate_register_gas(&self, params: &CommitmentParams, value: U256) -> OrchestratorResult<u64>;

    /// Point the name at the configured public resolver.
    async fn set_resolver(&self, label: &EnsLabel) -> OrchestratorResult<TxHash>;

    async fn set_addr(&self, label: &EnsLabel, addr: Address) -> OrchestratorResult<TxHash>;

    async fn set_text(&self, label: &EnsLabel, key: &str, value: &str) -> OrchestratorResult<TxHash>;

    async fn set_contenthash(&self, label: &EnsLabel, hash: &Bytes) -> OrchestratorResult<TxHash>;
}

/// JSON-RPC backed gateway.
#[derive(Clone)]
pub struct EnsGateway {
    client: BlockchainClient,
    sender: Option<TxSender>,
    contracts: EnsContracts,
}

impl EnsGateway {
    /// Read-only gateway (simulate mode); write methods fail with `ConfigMissing`.
    pub fn read_only(client: BlockchainClient, contracts: EnsContracts) -> Self {
        Self {
            client,
            sender: None,
            contracts,
        }
    }

    pub fn with_sender(sender: TxSender, contracts: EnsContracts) -> Self {
        Self {
            client: sender.client().clone(),
            sender: Some(sender),
            contracts,
        }
    }

    pub fn contracts(&self) -> &EnsContracts {
        &self.contracts
    }

    async fn read<C: SolCall>(&self, to: Address, call: C) -> OrchestratorResult<C::Return> {
        let request = TransactionRequest::default()
            .with_to(to)
            .with_input(Bytes::from(call.abi_encode()));
        let output = self.client.call(request).await?;
        C::abi_decode_returns(&output)
            .map_err(|e| BlockchainError::Abi(format!("{}: {}", C::SIGNATURE, e)).into())
    }

    async fn send<C: SolCall>(&self, to: Address, value: U256, call: C) -> OrchestratorResult<TxHash> {
        let sender = self.sender.as_ref().ok_or_else(|| {
            OrchestratorError::ConfigMissing("a signing key is required to send transactions".to_string())
        })?;
        tracing::debug!(to = %to, function = C::SIGNATURE, "Sending contract call");
        sender
            .send_and_confirm(to, value, Bytes::from(call.abi_encode()))
            .await
    }

    /// Registry owner of the node, without unwrapping.
    async fn registry_owner(&self, node: B256) -> OrchestratorResult<Address> {
        self.read(self.contracts.registry, IEnsRegistry::ownerCall { node })
            .await
    }
}

#[async_trait]
impl RegistrarGateway for EnsGateway {
    async fn min_commitment_age(&self) -> OrchestratorResult<u64> {
        let age = self
            .read(
                self.contracts.registrar_controller,
                IRegistrarController::minCommitmentAgeCall {},
            )
            .await?;
        u64::try_from(age).map_err(|_| {
            BlockchainError::Abi(format!("minCommitmentAge out of range: {}", age)).into()
        })
    }

    async fn available(&self, label: &EnsLabel) -> OrchestratorResult<bool> {
        self.read(
            self.contracts.registrar_controller,
            IRegistrarController::availableCall {
                name: label.as_str().to_string(),
            },
        )
        .await
    }

    async fn owner(&self, label: &EnsLabel) -> OrchestratorResult<Address> {
        let node = label.node();
        let owner = self.registry_owner(node).await?;
        if owner != self.contracts.name_wrapper {
            return Ok(owner);
        }
        self.read(
            self.contracts.name_wrapper,
            INameWrapper::ownerOfCall {
                id: U256::from_be_bytes(node.0),
            },
        )
        .await
    }

    async fn rent_price(&self, label: &EnsLabel, duration_secs: u64) -> OrchestratorResult<U256> {
        let price = self
            .read(
                self.contracts.registrar_controller,
                IRegistrarController::rentPriceCall {
                    name: label.as_str().to_string(),
                    duration: U256::from(duration_secs),
                },
            )
            .await?;
        Ok(price.base.saturating_add(price.premium))
    }

    async fn make_commitment(&self, params: &CommitmentParams) -> OrchestratorResult<B256> {
        self.read(self.contracts.registrar_controller, params.make_commitment_call())
            .await
    }

    async fn commit(&self, commitment: B256) -> OrchestratorResult<TxHash> {
        self.send(
            self.contracts.registrar_controller,
            U256::ZERO,
            IRegistrarController::commitCall { commitment },
        )
        .await
    }

    async fn register(&self, params: &CommitmentParams, value: U256) -> OrchestratorResult<TxHash> {
        self.send(self.contracts.registrar_controller, value, params.register_call())
            .await
    }

    async fn estimate_register_gas(&self, params: &CommitmentParams, value: U256) -> OrchestratorResult<u64> {
        let from = self.sender.as_ref().map(|s| s.address()).unwrap_or(params.owner);
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(self.contracts.registrar_controller)
            .with_value(value)
            .with_input(Bytes::from(params.register_call().abi_encode()));
        Ok(self.client.estimate_gas(request).await?)
    }

    async fn set_resolver(&self, label: &EnsLabel) -> OrchestratorResult<TxHash> {
        let node = label.node();
        let resolver = self.contracts.public_resolver;
        // Wrapped names are controlled through the wrapper, not the registry.
        if self.registry_owner(node).await? == self.contracts.name_wrapper {
            self.send(
                self.contracts.name_wrapper,
                U256::ZERO,
                INameWrapper::setResolverCall { node, resolver },
            )
            .await
        } else {
            self.send(
                self.contracts.registry,
                U256::ZERO,
                IEnsRegistry::setResolverCall { node, resolver },
            )
            .await
        }
    }

    async fn set_addr(&self, label: &EnsLabel, addr: Address) -> OrchestratorResult<TxHash> {
        self.send(
            self.contracts.public_resolver,
            U256::ZERO,
            IPublicResolver::setAddrCall {
                node: label.node(),
                coinType: U256::from(COIN_TYPE_ETH),
                a: Bytes::copy_from_slice(addr.as_slice()),
            },
        )
        .await
    }

    async fn set_text(&self, label: &EnsLabel, key: &str, value: &str) -> OrchestratorResult<TxHash> {
        self.send(
            self.contracts.public_resolver,
            U256::ZERO,
            IPublicResolver::setTextCall {
                node: label.node(),
                key: key.to_string(),
                value: value.to_string(),
            },
        )
        .await
    }

    async fn set_contenthash(&self, label: &EnsLabel, hash: &Bytes) -> OrchestratorResult<TxHash> {
        self.send(
            self.contracts.public_resolver,
            U256::ZERO,
            IPublicResolver::setContenthashCall {
                node: label.node(),
                hash: hash.clone(),
            },
        )
        .await
    }
}

/// Current ERC-721 owner of the label's base-registrar token.
pub async fn token_owner(
    client: &BlockchainClient,
    contracts: &EnsContracts,
    label: &EnsLabel,
) -> OrchestratorResult<Address> {
    let call = IBaseRegistrar::ownerOfCall {
        tokenId: label.token_id(),
    };
    let request = TransactionRequest::default()
        .with_to(contracts.base_registrar)
        .with_input(Bytes::from(call.abi_encode()));
    let output = client.call(request).await?;
    IBaseRegistrar::ownerOfCall::abi_decode_returns(&output)
        .map_err(|e| BlockchainError::Abi(format!("ownerOf: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnsConfig, NetworkConfig};

    fn gateway() -> EnsGateway {
        let client = BlockchainClient::new(NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            ..NetworkConfig::default()
        })
        .unwrap();
        EnsGateway::read_only(client, EnsContracts::from_config(&EnsConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_read_only_gateway_refuses_writes() {
        let err = gateway().commit(B256::ZERO).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ConfigMissing(_)));
    }

    #[tokio::test]
    async fn test_unreachable_rpc_is_blockchain_error() {
        let label = EnsLabel::parse("example").unwrap();
        let err = gateway().available(&label).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Blockchain(_)));
    }
}
