//! ENS contract interfaces and deployment addresses.

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolValue;

use crate::config::EnsConfig;
use crate::error::{OrchestratorError, OrchestratorResult};

sol! {
    /// Rent quote returned by the registrar controller.
    #[derive(Debug, PartialEq, Eq)]
    struct Price {
        uint256 base;
        uint256 premium;
    }

    interface IRegistrarController {
        function minCommitmentAge() external view returns (uint256);
        function available(string name) external view returns (bool);
        function rentPrice(string name, uint256 duration) external view returns (Price price);
        function makeCommitment(
            string name,
            address owner,
            uint256 duration,
            bytes32 secret,
            address resolver,
            bytes[] data,
            bool reverseRecord,
            uint16 ownerControlledFuses
        ) external pure returns (bytes32);
        function commit(bytes32 commitment) external;
        function register(
            string name,
            address owner,
            uint256 duration,
            bytes32 secret,
            address resolver,
            bytes[] data,
            bool reverseRecord,
            uint16 ownerControlledFuses
        ) external payable;
    }

    interface IEnsRegistry {
        function owner(bytes32 node) external view returns (address);
        function setResolver(bytes32 node, address resolver) external;
    }

    interface INameWrapper {
        function ownerOf(uint256 id) external view returns (address);
        function setResolver(bytes32 node, address resolver) external;
    }

    interface IPublicResolver {
        function setAddr(bytes32 node, uint256 coinType, bytes a) external;
        function setText(bytes32 node, string key, string value) external;
        function setContenthash(bytes32 node, bytes hash) external;
    }

    interface IBaseRegistrar {
        function ownerOf(uint256 tokenId) external view returns (address);
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
    }
}

/// SLIP-44 coin type for ETH address records.
pub const COIN_TYPE_ETH: u64 = 60;

/// Seconds in a registration year as the controller counts them.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Parsed ENS deployment addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsContracts {
    pub registry: Address,
    pub registrar_controller: Address,
    pub public_resolver: Address,
    pub name_wrapper: Address,
    pub base_registrar: Address,
}

impl EnsContracts {
    pub fn from_config(config: &EnsConfig) -> OrchestratorResult<Self> {
        Ok(Self {
            registry: parse_address("ens.registry", &config.registry)?,
            registrar_controller: parse_address("ens.registrar_controller", &config.registrar_controller)?,
            public_resolver: parse_address("ens.public_resolver", &config.public_resolver)?,
            name_wrapper: parse_address("ens.name_wrapper", &config.name_wrapper)?,
            base_registrar: parse_address("ens.base_registrar", &config.base_registrar)?,
        })
    }
}

fn parse_address(field: &str, value: &str) -> OrchestratorResult<Address> {
    value
        .parse()
        .map_err(|_| OrchestratorError::ConfigMissing(format!("{} is not a valid address: {}", field, value)))
}

/// Registration duration for a number of years (at least one year).
pub fn duration_for_years(years: u64) -> u64 {
    years.max(1).saturating_mul(SECONDS_PER_YEAR)
}

/// Inputs bound by a commitment. Resolver, extra data, reverse record and
/// fuses are fixed to their empty values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentParams {
    pub label: String,
    pub owner: Address,
    pub duration_secs: u64,
    pub secret: B256,
}

impl CommitmentParams {
    /// keccak256(abi.encode(labelhash, owner, duration, secret, resolver, data, reverseRecord, fuses))
    pub fn commitment_hash(&self) -> B256 {
        let label_hash = alloy::primitives::keccak256(self.label.as_bytes());
        let encoded = (
            label_hash,
            self.owner,
            U256::from(self.duration_secs),
            self.secret,
            Address::ZERO,
            Vec::<Bytes>::new(),
            false,
            0u16,
        )
            .abi_encode_params();
        alloy::primitives::keccak256(encoded)
    }

    pub fn make_commitment_call(&self) -> IRegistrarController::makeCommitmentCall {
        IRegistrarController::makeCommitmentCall {
            name: self.label.clone(),
            owner: self.owner,
            duration: U256::from(self.duration_secs),
            secret: self.secret,
            resolver: Address::ZERO,
            data: Vec::new(),
            reverseRecord: false,
            ownerControlledFuses: 0,
        }
    }

    pub fn register_call(&self) -> IRegistrarController::registerCall {
        IRegistrarController::registerCall {
            name: self.label.clone(),
            owner: self.owner,
            duration: U256::from(self.duration_secs),
            secret: self.secret,
            resolver: Address::ZERO,
            data: Vec::new(),
            reverseRecord: false,
            ownerControlledFuses: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    fn params() -> CommitmentParams {
        CommitmentParams {
            label: "example".to_string(),
            owner: Address::repeat_byte(0x11),
            duration_secs: SECONDS_PER_YEAR,
            secret: B256::repeat_byte(0x42),
        }
    }

    #[test]
    fn test_default_addresses_parse() {
        let contracts = EnsContracts::from_config(&EnsConfig::default()).unwrap();
        assert_ne!(contracts.registrar_controller, Address::ZERO);
        assert_ne!(contracts.base_registrar, contracts.registry);
    }

    #[test]
    fn test_commitment_is_deterministic_and_secret_bound() {
        let a = params();
        assert_eq!(a.commitment_hash(), params().commitment_hash());

        let mut b = params();
        b.secret = B256::repeat_byte(0x43);
        assert_ne!(a.commitment_hash(), b.commitment_hash());

        let mut c = params();
        c.duration_secs *= 2;
        assert_ne!(a.commitment_hash(), c.commitment_hash());
    }

    #[test]
    fn test_duration_for_years() {
        assert_eq!(duration_for_years(0), SECONDS_PER_YEAR);
        assert_eq!(duration_for_years(3), 3 * SECONDS_PER_YEAR);
    }

    #[test]
    fn test_register_call_selector_differs_from_commit() {
        let register = params().register_call().abi_encode();
        let commit = IRegistrarController::commitCall {
            commitment: B256::ZERO,
        }
        .abi_encode();
        assert_ne!(register[..4], commit[..4]);
    }
}
