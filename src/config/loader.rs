//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::OrchestratorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the configured JSON-RPC endpoint.
pub const RPC_URL_ENV_VAR: &str = "ENS_ORCH_RPC_URL";

/// Overrides the configured private relay endpoint.
pub const RELAY_URL_ENV_VAR: &str = "ENS_ORCH_RELAY_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
///
/// Without a file every section falls back to its defaults.
pub fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => OrchestratorConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply endpoint overrides. `lookup` abstracts the environment for tests.
pub fn apply_env_overrides<F>(config: &mut OrchestratorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(RPC_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        config.network.rpc_url = url;
    }
    if let Some(url) = lookup(RELAY_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        config.rescue.relay_url = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [network]
            rpc_url = "http://127.0.0.1:8545"
            chain_id = 31337

            [rescue]
            retry_blocks = 3
            "#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.network.chain_id, 31337);
        assert_eq!(config.rescue.retry_blocks, 3);
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[fees]\nmultiplier = 0").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("fees.multiplier"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = OrchestratorConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            RPC_URL_ENV_VAR => Some("http://rpc.example:8545".to_string()),
            _ => None,
        });
        assert_eq!(config.network.rpc_url, "http://rpc.example:8545");
        assert_eq!(config.rescue.relay_url, "https://relay.flashbots.net");
    }
}
