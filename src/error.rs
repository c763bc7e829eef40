//! Orchestration error taxonomy and process exit codes.

use alloy::primitives::Address;
use thiserror::Error;

use crate::blockchain::types::BlockchainError;
use crate::config::ConfigError;

/// Exit status for an operator cancellation (128 + SIGINT).
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Errors surfaced by the commit-reveal and bundle flows.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Label is empty, multi-level, or cannot be mapped to ASCII.
    #[error("Invalid label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    /// Fee inputs out of range or overflowing.
    #[error("Invalid fee parameters: {0}")]
    InvalidFeeParameters(String),

    /// Reveal requested without a usable stored commitment.
    #[error("No usable commitment for '{label}': {reason}")]
    MissingCommitment { label: String, reason: String },

    /// Commitment is younger than the protocol minimum.
    #[error("Commitment for '{label}' is only {age_secs}s old; need >= {min_age_secs}s")]
    CommitmentImmature {
        label: String,
        age_secs: u64,
        min_age_secs: u64,
    },

    /// Resource or asset owned by someone other than the expected party.
    #[error("{subject} is owned by {actual}, expected {expected}")]
    OwnershipConflict {
        subject: String,
        expected: Address,
        actual: Address,
    },

    /// Wrong network, insufficient funds, or another preflight failure.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The relay predicted the bundle would fail.
    #[error("Bundle simulation failed: {0}")]
    SimulationFailed(String),

    /// Every target block passed without the bundle landing.
    #[error(
        "Bundle not included after {attempts} attempts; raise the priority fee or fee multiplier"
    )]
    BundleNotIncluded { attempts: u32 },

    /// A submitted transaction reverted.
    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },

    /// Required credential or endpoint absent.
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    /// Commitment store I/O or (de)serialization failure.
    #[error("Commitment store error: {0}")]
    Store(String),

    /// Relay transport or submission failure (distinct from simulation).
    #[error("Relay error: {0}")]
    Relay(String),

    /// Operator aborted the run.
    #[error("Cancelled by operator")]
    Cancelled,
}

/// Result type for orchestration operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

impl OrchestratorError {
    pub fn invalid_label(label: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLabel {
            label: label.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for a fatal occurrence of this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BundleNotIncluded { .. } => 2,
            Self::SimulationFailed(_) => 3,
            Self::PreconditionFailed(_) | Self::OwnershipConflict { .. } => 4,
            Self::ConfigMissing(_) | Self::Config(_) => 78,
            Self::Cancelled => CANCELLED_EXIT_CODE,
            _ => 1,
        }
    }

    /// Short stable name used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidLabel { .. } => "InvalidLabel",
            Self::InvalidFeeParameters(_) => "InvalidFeeParameters",
            Self::MissingCommitment { .. } => "MissingCommitment",
            Self::CommitmentImmature { .. } => "CommitmentImmature",
            Self::OwnershipConflict { .. } => "OwnershipConflict",
            Self::PreconditionFailed(_) => "PreconditionFailed",
            Self::SimulationFailed(_) => "SimulationFailed",
            Self::BundleNotIncluded { .. } => "BundleNotIncluded",
            Self::TransactionReverted { .. } => "TransactionReverted",
            Self::ConfigMissing(_) => "ConfigMissing",
            Self::Config(_) => "Config",
            Self::Blockchain(_) => "Blockchain",
            Self::Store(_) => "Store",
            Self::Relay(_) => "Relay",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let not_included = OrchestratorError::BundleNotIncluded { attempts: 9 };
        let simulation = OrchestratorError::SimulationFailed("revert".into());
        let precondition = OrchestratorError::PreconditionFailed("wrong chain".into());
        let missing = OrchestratorError::ConfigMissing("ENS_ORCH_FUNDER_KEY".into());

        assert_eq!(not_included.exit_code(), 2);
        assert_eq!(simulation.exit_code(), 3);
        assert_eq!(precondition.exit_code(), 4);
        assert_eq!(missing.exit_code(), 78);
        assert_eq!(OrchestratorError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_not_included_message_suggests_fees() {
        let err = OrchestratorError::BundleNotIncluded { attempts: 9 };
        assert!(err.to_string().contains("priority fee"));
        assert_eq!(err.kind(), "BundleNotIncluded");
    }

    #[test]
    fn test_immature_message() {
        let err = OrchestratorError::CommitmentImmature {
            label: "example.eth".into(),
            age_secs: 12,
            min_age_secs: 60,
        };
        assert_eq!(
            err.to_string(),
            "Commitment for 'example.eth' is only 12s old; need >= 60s"
        );
    }
}
