//! Shared fakes for integration tests.

#![allow(dead_code)]

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use ens_orchestrator::bundle::types::{BundleRole, BundleTransaction};
use ens_orchestrator::bundle::{
    BundleFactory, BundleRelay, InclusionOutcome, SignedBundle, SimulationReport,
};
use ens_orchestrator::ens::{CommitmentParams, EnsLabel, RegistrarGateway};
use ens_orchestrator::error::{OrchestratorError, OrchestratorResult};
use ens_orchestrator::fees::quote;

/// Anvil's first three development keys.
pub const KEY_A: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const KEY_B: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const KEY_C: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

pub fn owner() -> Address {
    Address::repeat_byte(0x11)
}

// ---------------------------------------------------------------------------
// Registrar
// ---------------------------------------------------------------------------

/// In-memory registrar. Every write is counted as a submission.
pub struct MockGateway {
    pub min_age: u64,
    pub rent: U256,
    unavailable: HashMap<String, Address>,
    stale_owners: HashMap<String, Address>,
    failing_records: HashSet<String>,
    calls: Mutex<Vec<String>>,
    submissions: AtomicU32,
    tx_counter: AtomicU64,
}

impl MockGateway {
    pub fn new(min_age: u64) -> Self {
        Self {
            min_age,
            rent: U256::from(3_125_000_000_000_000u64),
            unavailable: HashMap::new(),
            stale_owners: HashMap::new(),
            failing_records: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            submissions: AtomicU32::new(0),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Mark `label` as taken by `owner`.
    pub fn taken(mut self, label: &str, owner: Address) -> Self {
        self.unavailable.insert(label.to_string(), owner);
        self
    }

    /// `label` is available but the registry still lists `owner`.
    pub fn stale_owner(mut self, label: &str, owner: Address) -> Self {
        self.stale_owners.insert(label.to_string(), owner);
        self
    }

    /// Make a record write fail (`addr`, `text:<key>`, `contenthash`, `resolver`).
    pub fn failing(mut self, record: &str) -> Self {
        self.failing_records.insert(record.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> u32 {
        self.submissions.load(Ordering::SeqCst)
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn submit(&self, call: String, record: Option<&str>) -> OrchestratorResult<TxHash> {
        self.log(call);
        if let Some(record) = record {
            if self.failing_records.contains(record) {
                return Err(OrchestratorError::TransactionReverted {
                    tx_hash: format!("{}-reverted", record),
                });
            }
        }
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TxHash::from(U256::from(n)))
    }
}

#[async_trait]
impl RegistrarGateway for MockGateway {
    async fn min_commitment_age(&self) -> OrchestratorResult<u64> {
        Ok(self.min_age)
    }

    async fn available(&self, label: &EnsLabel) -> OrchestratorResult<bool> {
        self.log(format!("available:{}", label));
        Ok(!self.unavailable.contains_key(label.as_str()))
    }

    async fn owner(&self, label: &EnsLabel) -> OrchestratorResult<Address> {
        Ok(self
            .unavailable
            .get(label.as_str())
            .or_else(|| self.stale_owners.get(label.as_str()))
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn rent_price(&self, label: &EnsLabel, duration_secs: u64) -> OrchestratorResult<U256> {
        self.log(format!("rent_price:{}:{}", label.full_name(), duration_secs));
        Ok(self.rent)
    }

    async fn make_commitment(&self, params: &CommitmentParams) -> OrchestratorResult<B256> {
        Ok(params.commitment_hash())
    }

    async fn commit(&self, commitment: B256) -> OrchestratorResult<TxHash> {
        self.submit(format!("commit:{}", commitment), None)
    }

    async fn register(&self, params: &CommitmentParams, value: U256) -> OrchestratorResult<TxHash> {
        self.submit(format!("register:{}:{}", params.label, value), None)
    }

    async fn estimate_register_gas(&self, _params: &CommitmentParams, _value: U256) -> OrchestratorResult<u64> {
        self.log("estimate_register_gas".to_string());
        Ok(265_000)
    }

    async fn set_resolver(&self, label: &EnsLabel) -> OrchestratorResult<TxHash> {
        self.submit(format!("set_resolver:{}", label), Some("resolver"))
    }

    async fn set_addr(&self, label: &EnsLabel, addr: Address) -> OrchestratorResult<TxHash> {
        self.submit(format!("set_addr:{}:{}", label, addr), Some("addr"))
    }

    async fn set_text(&self, label: &EnsLabel, key: &str, value: &str) -> OrchestratorResult<TxHash> {
        let record = format!("text:{}", key);
        self.submit(format!("set_text:{}:{}={}", label, key, value), Some(&record))
    }

    async fn set_contenthash(&self, label: &EnsLabel, _hash: &Bytes) -> OrchestratorResult<TxHash> {
        self.submit(format!("set_contenthash:{}", label), Some("contenthash"))
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Factory whose head advances by one block per observation.
pub struct MockFactory {
    head: AtomicU64,
    builds: AtomicU32,
}

impl MockFactory {
    pub fn new(head: u64) -> Self {
        Self {
            head: AtomicU64::new(head),
            builds: AtomicU32::new(0),
        }
    }

    pub fn builds(&self) -> u32 {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<'a> BundleFactory for &'a MockFactory {
    async fn head_block(&self) -> OrchestratorResult<u64> {
        Ok(self.head.fetch_add(1, Ordering::SeqCst))
    }

    async fn build(&self) -> OrchestratorResult<SignedBundle> {
        let n = self.builds.fetch_add(1, Ordering::SeqCst) as u64;
        let tx = |role, byte: u8| BundleTransaction {
            role,
            signer: Address::repeat_byte(byte),
            nonce: n,
            gas_limit: 21_000,
            value: U256::ZERO,
            hash: TxHash::repeat_byte(byte.wrapping_add(n as u8)),
            raw: Bytes::from(vec![0x02, byte]),
        };
        Ok(SignedBundle {
            transactions: vec![tx(BundleRole::Funding, 0xaa), tx(BundleRole::Transfer, 0xbb)],
            quote: quote(10_000_000_000, 2, 1_000_000_000)?,
        })
    }
}

/// Relay that replays scripted inclusion outcomes.
pub struct MockRelay {
    outcomes: Mutex<VecDeque<InclusionOutcome>>,
    simulation_error: Option<String>,
    sends: AtomicU32,
    simulations: AtomicU32,
    targets: Mutex<Vec<u64>>,
}

impl MockRelay {
    /// Every attempt ends with `BlockPassed` unless scripted otherwise.
    pub fn new(outcomes: Vec<InclusionOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            simulation_error: None,
            sends: AtomicU32::new(0),
            simulations: AtomicU32::new(0),
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_simulation(error: &str) -> Self {
        Self {
            simulation_error: Some(error.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn sends(&self) -> u32 {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn simulations(&self) -> u32 {
        self.simulations.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<u64> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl<'a> BundleRelay for &'a MockRelay {
    async fn simulate(
        &self,
        _bundle: &SignedBundle,
        _target_block: u64,
        _state_block: u64,
    ) -> OrchestratorResult<SimulationReport> {
        self.simulations.fetch_add(1, Ordering::SeqCst);
        Ok(SimulationReport {
            total_gas_used: 73_000,
            coinbase_diff: U256::from(1_000_000u64),
            bundle_hash: None,
            error: self.simulation_error.clone(),
        })
    }

    async fn send(&self, _bundle: &SignedBundle, target_block: u64) -> OrchestratorResult<Option<String>> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target_block);
        Ok(Some(format!("0xbundle{}", target_block)))
    }

    async fn wait_for_inclusion(
        &self,
        _bundle: &SignedBundle,
        _target_block: u64,
    ) -> OrchestratorResult<InclusionOutcome> {
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(InclusionOutcome::BlockPassed))
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC endpoint
// ---------------------------------------------------------------------------

/// Method names received by a mock endpoint, in order.
pub type RpcLog = Arc<Mutex<Vec<String>>>;

/// Serve JSON-RPC on `server`, answering each call with `handler(method, params)`.
/// `None` from the handler becomes a "method not found" error. The request id
/// is echoed back.
pub async fn mock_rpc<F>(server: &mut mockito::ServerGuard, handler: F) -> (mockito::Mock, RpcLog)
where
    F: Fn(&str, &Value) -> Option<Value> + Send + Sync + 'static,
{
    let log: RpcLog = Arc::new(Mutex::new(Vec::new()));
    let seen = log.clone();
    let mock = server
        .mock("POST", "/")
        .with_header("content-type", "application/json")
        .with_body_from_request(move |request| {
            let body: Value = request
                .body()
                .ok()
                .and_then(|b| serde_json::from_slice(b).ok())
                .unwrap_or(Value::Null);
            let id = body.get("id").cloned().unwrap_or(json!(1));
            let method = body.get("method").and_then(Value::as_str).unwrap_or("").to_string();
            let params = body.get("params").cloned().unwrap_or(Value::Null);
            seen.lock().unwrap().push(method.clone());

            let response = match handler(&method, &params) {
                Some(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                None => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": -32601, "message": format!("method {} not found", method) }
                }),
            };
            response.to_string().into_bytes()
        })
        .expect_at_least(0)
        .create_async()
        .await;
    (mock, log)
}

pub fn count(log: &RpcLog, method: &str) -> usize {
    log.lock().unwrap().iter().filter(|m| *m == method).count()
}

/// ABI-encoded single address return value.
pub fn encoded_address(address: Address) -> Value {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    json!(format!("0x{}", alloy::primitives::hex::encode(word)))
}

/// Fee history with a flat base fee of 10 gwei.
pub fn fee_history() -> Value {
    json!({
        "oldestBlock": "0x10",
        "baseFeePerGas": ["0x2540be400", "0x2540be400"],
        "gasUsedRatio": [0.5],
        "reward": []
    })
}
