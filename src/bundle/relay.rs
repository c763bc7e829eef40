//! Private relay client (Flashbots-compatible JSON-RPC).
//!
//! # Responsibilities
//! - Sign every request body with the relay auth key
//! - `eth_callBundle`: simulation, reported separately from submission errors
//! - `eth_sendBundle`: submission for one target block
//! - Wait for the target block and classify the inclusion outcome

use alloy::primitives::{hex, keccak256};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::{BlockchainClient, Wallet};
use crate::bundle::types::{CallBundleResponse, InclusionOutcome, SignedBundle, SimulationReport};
use crate::config::RetryConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::resilience::retries::retry_with_backoff;

/// Header carrying `<address>:<signature>` over the request body.
pub const SIGNATURE_HEADER: &str = "X-Flashbots-Signature";

/// Relay operations used by the retry controller.
#[async_trait]
pub trait BundleRelay: Send + Sync {
    /// Simulate `bundle` on top of `state_block` as if mined in `target_block`.
    async fn simulate(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
        state_block: u64,
    ) -> OrchestratorResult<SimulationReport>;

    /// Submit `bundle` for `target_block`. Returns the relay's bundle hash.
    async fn send(&self, bundle: &SignedBundle, target_block: u64) -> OrchestratorResult<Option<String>>;

    /// Block until `target_block` has been mined (or the wait limit expires)
    /// and report whether the bundle landed.
    async fn wait_for_inclusion(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> OrchestratorResult<InclusionOutcome>;
}

/// Failure of one relay round-trip.
#[derive(Debug)]
enum RelayCallError {
    /// Connection, timeout or 5xx; worth retrying.
    Transport(String),
    /// The relay answered with a JSON-RPC error.
    Rpc { code: i64, message: String },
}

impl std::fmt::Display for RelayCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport: {}", msg),
            Self::Rpc { code, message } => write!(f, "rpc error {}: {}", code, message),
        }
    }
}

/// Flashbots-style relay over HTTPS.
pub struct FlashbotsRelay {
    http: reqwest::Client,
    url: url::Url,
    auth: Wallet,
    chain: BlockchainClient,
    retry: RetryConfig,
    inclusion_timeout: Duration,
    poll_interval: Duration,
}

impl FlashbotsRelay {
    pub fn new(
        url: &str,
        auth: Wallet,
        chain: BlockchainClient,
        retry: RetryConfig,
        inclusion_timeout: Duration,
    ) -> OrchestratorResult<Self> {
        let url = url
            .parse()
            .map_err(|e| OrchestratorError::ConfigMissing(format!("invalid relay URL '{}': {}", url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(chain.config().rpc_timeout_secs.max(1)))
            .build()
            .map_err(|e| OrchestratorError::Relay(format!("HTTP client: {}", e)))?;
        let poll_interval = Duration::from_millis(chain.config().poll_interval_ms);
        Ok(Self {
            http,
            url,
            auth,
            chain,
            retry,
            inclusion_timeout,
            poll_interval,
        })
    }

    /// `X-Flashbots-Signature` value for `body`: the auth key's personal_sign
    /// over the hex-encoded keccak256 of the body.
    pub async fn signature_header(&self, body: &str) -> OrchestratorResult<String> {
        let digest = hex::encode_prefixed(keccak256(body.as_bytes()));
        let signature = self.auth.sign_message(digest.as_bytes()).await?;
        Ok(format!(
            "{}:{}",
            self.auth.address(),
            hex::encode_prefixed(signature.as_bytes())
        ))
    }

    async fn call_once(&self, method: &str, params: &Value) -> Result<Value, RelayCallError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        })
        .to_string();
        let signature = self
            .signature_header(&body)
            .await
            .map_err(|e| RelayCallError::Rpc { code: 0, message: e.to_string() })?;
        let signature = HeaderValue::from_str(&signature)
            .map_err(|e| RelayCallError::Rpc { code: 0, message: e.to_string() })?;

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| RelayCallError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RelayCallError::Transport(format!("HTTP {}", status)));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RelayCallError::Transport(format!("HTTP {}: unreadable body: {}", status, e)))?;

        if let Some(error) = payload.get("error") {
            return Err(RelayCallError::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        if !status.is_success() {
            return Err(RelayCallError::Rpc {
                code: i64::from(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }
        Ok(payload.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RelayCallError> {
        retry_with_backoff(
            &self.retry,
            method,
            |e: &RelayCallError| matches!(e, RelayCallError::Transport(_)),
            || self.call_once(method, &params),
        )
        .await
    }

    async fn classify(&self, bundle: &SignedBundle) -> OrchestratorResult<InclusionOutcome> {
        let mut included_in = None;
        for tx in &bundle.transactions {
            match self.chain.get_transaction_receipt(tx.hash).await? {
                Some(receipt) => included_in = receipt.block_number.or(included_in),
                None => {
                    included_in = None;
                    break;
                }
            }
        }
        if let Some(block_number) = included_in {
            return Ok(InclusionOutcome::Included { block_number });
        }

        for tx in &bundle.transactions {
            let nonce = self.chain.get_transaction_count(tx.signer).await?;
            if nonce > tx.nonce {
                return Ok(InclusionOutcome::AccountNonceTooHigh);
            }
        }
        Ok(InclusionOutcome::BlockPassed)
    }
}

fn bundle_params(bundle: &SignedBundle, target_block: u64) -> Value {
    json!({
        "txs": bundle.raw_transactions(),
        "blockNumber": format!("0x{:x}", target_block),
    })
}

#[async_trait]
impl BundleRelay for FlashbotsRelay {
    async fn simulate(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
        state_block: u64,
    ) -> OrchestratorResult<SimulationReport> {
        let mut params = bundle_params(bundle, target_block);
        params["stateBlockNumber"] = json!(format!("0x{:x}", state_block));

        match self.call("eth_callBundle", json!([params])).await {
            Ok(result) => {
                let response: CallBundleResponse = serde_json::from_value(result)
                    .map_err(|e| OrchestratorError::Relay(format!("malformed simulation response: {}", e)))?;
                Ok(response.into())
            }
            // A rejected simulation is a verdict on the bundle, not the transport.
            Err(RelayCallError::Rpc { message, .. }) => Ok(SimulationReport {
                error: Some(message),
                ..SimulationReport::default()
            }),
            Err(e) => Err(OrchestratorError::Relay(format!("eth_callBundle: {}", e))),
        }
    }

    async fn send(&self, bundle: &SignedBundle, target_block: u64) -> OrchestratorResult<Option<String>> {
        let result = self
            .call("eth_sendBundle", json!([bundle_params(bundle, target_block)]))
            .await
            .map_err(|e| OrchestratorError::Relay(format!("eth_sendBundle: {}", e)))?;
        Ok(result
            .get("bundleHash")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn wait_for_inclusion(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> OrchestratorResult<InclusionOutcome> {
        let reached = timeout(self.inclusion_timeout, async {
            let mut ticker = interval(self.poll_interval);
            loop {
                ticker.tick().await;
                match self.chain.get_block_number().await {
                    Ok(head) if head >= target_block => return,
                    Ok(head) => tracing::debug!(head, target_block, "Waiting for target block"),
                    Err(e) => tracing::warn!(error = %e, "Block number poll failed"),
                }
            }
        })
        .await;

        if reached.is_err() {
            return Ok(InclusionOutcome::TimedOut);
        }
        self.classify(bundle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    const AUTH_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn relay(url: &str) -> FlashbotsRelay {
        let chain = BlockchainClient::new(NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 2,
            ..NetworkConfig::default()
        })
        .unwrap();
        FlashbotsRelay::new(
            url,
            Wallet::from_private_key(AUTH_KEY, 1).unwrap(),
            chain,
            RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 2,
            },
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn bundle() -> SignedBundle {
        SignedBundle {
            transactions: Vec::new(),
            quote: crate::fees::quote(1, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_signature_header_format() {
        let relay = relay("https://relay.example");
        let header = relay.signature_header("{}").await.unwrap();
        let (address, signature) = header.split_once(':').unwrap();
        assert_eq!(address, relay.auth.address().to_string());
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + 65 * 2);
    }

    #[tokio::test]
    async fn test_send_returns_bundle_hash() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header(SIGNATURE_HEADER, mockito::Matcher::Regex("^0x[0-9a-fA-F]{40}:0x".into()))
            .match_body(mockito::Matcher::Regex("eth_sendBundle".into()))
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"bundleHash":"0xfeed"}}"#)
            .create_async()
            .await;

        let hash = relay(&server.url()).send(&bundle(), 100).await.unwrap();
        assert_eq!(hash.as_deref(), Some("0xfeed"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_simulation_rpc_error_is_a_verdict() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"nonce too low"}}"#)
            .create_async()
            .await;

        let report = relay(&server.url()).simulate(&bundle(), 100, 99).await.unwrap();
        assert_eq!(report.error.as_deref(), Some("nonce too low"));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let err = relay(&server.url()).send(&bundle(), 100).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Relay(_)));
        mock.assert_async().await;
    }
}
