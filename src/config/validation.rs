//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that contract addresses and URLs parse
//! - Validate value ranges (multipliers >= 1, timeouts > 0, margins >= 100%)
//! - Check that decimal amounts (gwei / ETH strings) parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OrchestratorConfig → Result<(), Vec<ValidationError>>
//! - An empty RPC URL is not an error here; it is reported as a missing
//!   endpoint when a command actually needs the chain

use alloy::primitives::utils::{parse_ether, parse_units};
use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::OrchestratorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let network = &config.network;
    if !network.rpc_url.is_empty() && network.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("network.rpc_url", "not a valid URL"));
    }
    for (i, failover) in network.failover_urls.iter().enumerate() {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new(
                &format!("network.failover_urls[{}]", i),
                "not a valid URL",
            ));
        }
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }
    if network.poll_interval_ms == 0 {
        errors.push(ValidationError::new("network.poll_interval_ms", "must be > 0"));
    }

    if config.fees.multiplier < 1 {
        errors.push(ValidationError::new("fees.multiplier", "must be >= 1"));
    }
    check_gwei(&mut errors, "fees.priority_fee_gwei", &config.fees.priority_fee_gwei);
    if config.fees.gas_limit_margin_percent < 100 {
        errors.push(ValidationError::new(
            "fees.gas_limit_margin_percent",
            "must be >= 100",
        ));
    }

    let ens = &config.ens;
    for (field, value) in [
        ("ens.registry", &ens.registry),
        ("ens.registrar_controller", &ens.registrar_controller),
        ("ens.public_resolver", &ens.public_resolver),
        ("ens.name_wrapper", &ens.name_wrapper),
        ("ens.base_registrar", &ens.base_registrar),
    ] {
        if value.parse::<Address>().is_err() {
            errors.push(ValidationError::new(field, format!("invalid address '{}'", value)));
        }
    }

    let rescue = &config.rescue;
    if rescue.relay_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::new("rescue.relay_url", "not a valid URL"));
    }
    if rescue.fee_multiplier < 1 {
        errors.push(ValidationError::new("rescue.fee_multiplier", "must be >= 1"));
    }
    check_gwei(&mut errors, "rescue.priority_fee_gwei", &rescue.priority_fee_gwei);
    if parse_ether(&rescue.fund_buffer_eth).is_err() {
        errors.push(ValidationError::new(
            "rescue.fund_buffer_eth",
            format!("invalid ETH amount '{}'", rescue.fund_buffer_eth),
        ));
    }
    if rescue.transfer_gas_margin_percent < 100 {
        errors.push(ValidationError::new(
            "rescue.transfer_gas_margin_percent",
            "must be >= 100",
        ));
    }
    if rescue.inclusion_timeout_secs == 0 {
        errors.push(ValidationError::new("rescue.inclusion_timeout_secs", "must be > 0"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be >= 1"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_gwei(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if parse_units(value, "gwei").is_err() {
        errors.push(ValidationError::new(field, format!("invalid gwei amount '{}'", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&OrchestratorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = OrchestratorConfig::default();
        config.fees.multiplier = 0;
        config.rescue.fund_buffer_eth = "lots".to_string();
        config.ens.registry = "0xnope".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "fees.multiplier"));
        assert!(errors.iter().any(|e| e.field == "rescue.fund_buffer_eth"));
        assert!(errors.iter().any(|e| e.field == "ens.registry"));
    }

    #[test]
    fn test_bad_rpc_url() {
        let mut config = OrchestratorConfig::default();
        config.network.rpc_url = "not a url".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "network.rpc_url: not a valid URL");
    }
}
