//! Command-line surface.
//!
//! `register` drives the commit-reveal scheduler over a batch of names,
//! `rescue` moves a name's token out of a holder wallet in one private
//! bundle, and `status` shows stored commitments without touching the chain
//! beyond reading the minimum commitment age.

use alloy::primitives::Address;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::blockchain::wallet::{
    FUNDER_KEY_ENV_VAR, HOLDER_KEY_ENV_VAR, PRIVATE_KEY_ENV_VAR, RELAY_AUTH_KEY_ENV_VAR,
};
use crate::blockchain::{BlockchainClient, BlockchainError, TxSender, Wallet};
use crate::bundle::{run_rescue, RescueKeys, RescueRequest};
use crate::config::loader::RPC_URL_ENV_VAR;
use crate::config::OrchestratorConfig;
use crate::ens::contracts::duration_for_years;
use crate::ens::records::parse_text_record;
use crate::ens::scheduler::status_reports;
use crate::ens::{
    CommitRevealScheduler, CommitmentStore, EnsContracts, EnsGateway, EnsLabel, RecordRequest,
    RegistrarGateway, RunMode, SchedulerOptions,
};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::fees::FeePolicy;
use crate::lifecycle::Shutdown;
use crate::observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "ens-orchestrator", version)]
#[command(about = "Commit-reveal ENS registration and private-bundle name rescue")]
pub struct Cli {
    /// TOML configuration file. Every field is optional.
    #[arg(short, long, global = true, env = "ENS_ORCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log line format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Overrides `observability.log_level`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register .eth names via commit-reveal.
    Register(RegisterArgs),
    /// Move a name's registrar token to a new owner in one private bundle.
    Rescue(RescueArgs),
    /// Show stored commitments.
    Status(StatusArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("mode").args(["commit_only", "reveal", "simulate"])))]
pub struct RegisterArgs {
    /// Names to register, `label` or `label.eth`.
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Owner of the registered names.
    #[arg(long)]
    pub owner: Address,

    /// Registration length in years (minimum 1).
    #[arg(long, default_value_t = 1)]
    pub years: u64,

    /// ETH address record to set.
    #[arg(long)]
    pub set_addr: Option<Address>,

    /// Text record `key=value`; repeatable.
    #[arg(long = "text", value_parser = parse_text_record)]
    pub texts: Vec<(String, String)>,

    /// Content pointer: `ipfs://…`, `ipns://…` or raw `0x…`.
    #[arg(long)]
    pub contenthash: Option<String>,

    /// Commit and store the secret, then stop.
    #[arg(long)]
    pub commit_only: bool,

    /// Reveal previously stored commitments.
    #[arg(long)]
    pub reveal: bool,

    /// Print rent and gas estimates without sending anything.
    #[arg(long, visible_alias = "rent-only")]
    pub simulate: bool,
}

impl RegisterArgs {
    pub fn mode(&self) -> RunMode {
        if self.simulate {
            RunMode::Simulate
        } else if self.reveal {
            RunMode::RevealOnly
        } else if self.commit_only {
            RunMode::CommitOnly
        } else {
            RunMode::Full
        }
    }

    pub fn records(&self) -> OrchestratorResult<RecordRequest> {
        let request = RecordRequest {
            addr: self.set_addr,
            texts: self.texts.clone(),
            ..RecordRequest::default()
        };
        match &self.contenthash {
            Some(uri) => request.with_contenthash(uri),
            None => Ok(request),
        }
    }
}

#[derive(Debug, Args)]
pub struct RescueArgs {
    /// Name whose registrar token is moved.
    #[arg(long)]
    pub label: String,

    /// Recipient of the token.
    #[arg(long)]
    pub new_owner: Address,

    /// Address that must own the token now (defaults to the holder key).
    #[arg(long)]
    pub expected_holder: Option<Address>,

    /// Relay endpoint override.
    #[arg(long)]
    pub relay_url: Option<String>,

    /// Extra target blocks after the first.
    #[arg(long)]
    pub retry_blocks: Option<u32>,

    /// Priority fee in gwei.
    #[arg(long)]
    pub priority_gwei: Option<String>,

    /// Base fee multiplier.
    #[arg(long)]
    pub fee_multiplier: Option<u64>,

    /// Funding safety buffer in ETH.
    #[arg(long)]
    pub fund_buffer_eth: Option<String>,
}

impl RescueArgs {
    /// Fold fee-aggressiveness flags into the rescue section.
    pub fn apply_to(&self, config: &mut OrchestratorConfig) {
        let rescue = &mut config.rescue;
        if let Some(blocks) = self.retry_blocks {
            rescue.retry_blocks = blocks;
        }
        if let Some(gwei) = &self.priority_gwei {
            rescue.priority_fee_gwei = gwei.clone();
        }
        if let Some(multiplier) = self.fee_multiplier {
            rescue.fee_multiplier = multiplier;
        }
        if let Some(buffer) = &self.fund_buffer_eth {
            rescue.fund_buffer_eth = buffer.clone();
        }
    }
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(required = true)]
    pub names: Vec<String>,
}

fn require_rpc(config: &OrchestratorConfig) -> OrchestratorResult<BlockchainClient> {
    if config.network.rpc_url.is_empty() {
        return Err(OrchestratorError::ConfigMissing(format!(
            "RPC endpoint: set {} or network.rpc_url",
            RPC_URL_ENV_VAR
        )));
    }
    Ok(BlockchainClient::new(config.network.clone())?)
}

/// Load a signing key from `var`; absence is a configuration error.
pub fn load_wallet(var: &str, chain_id: u64) -> OrchestratorResult<Wallet> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(Wallet::from_private_key(&key, chain_id)?),
        _ => Err(OrchestratorError::ConfigMissing(format!("signing key: set {}", var))),
    }
}

async fn verify_network(client: &BlockchainClient) -> OrchestratorResult<()> {
    match client.verify_chain_id().await {
        Ok(()) => Ok(()),
        Err(BlockchainError::ChainMismatch { expected, actual }) => Err(OrchestratorError::PreconditionFailed(
            format!("endpoint is on chain {}, expected {}", actual, expected),
        )),
        Err(e) => Err(e.into()),
    }
}

/// `register`: returns the process exit code.
pub async fn register(config: &OrchestratorConfig, args: &RegisterArgs, shutdown: Shutdown) -> OrchestratorResult<i32> {
    let mode = args.mode();
    let options = SchedulerOptions {
        owner: args.owner,
        duration_secs: duration_for_years(args.years),
        mode,
        records: args.records()?,
    };
    let contracts = EnsContracts::from_config(&config.ens)?;
    let client = require_rpc(config)?;
    verify_network(&client).await?;

    let gateway = if mode == RunMode::Simulate {
        EnsGateway::read_only(client, contracts)
    } else {
        let wallet = load_wallet(PRIVATE_KEY_ENV_VAR, config.network.chain_id)?;
        let fees = FeePolicy::new(
            config.fees.multiplier,
            &config.fees.priority_fee_gwei,
            Some(config.fees.max_fee_per_gas_gwei),
        )?;
        tracing::info!(signer = %wallet.address(), "Signing key loaded");
        let sender = TxSender::new(client, wallet, fees, config.fees.gas_limit_margin_percent);
        EnsGateway::with_sender(sender, contracts)
    };

    let store = CommitmentStore::new(config.store.resolve_dir());
    let scheduler = CommitRevealScheduler::new(gateway, store, shutdown);
    let batch = scheduler.run_batch(&args.names, &options).await?;

    for report in &batch.labels {
        println!("{}", report);
    }
    if batch.cancelled {
        println!("cancelled; stored commitments can be revealed later with --reveal");
    }
    Ok(batch.exit_code())
}

/// `rescue`: returns the process exit code.
pub async fn rescue(config: &OrchestratorConfig, args: &RescueArgs, shutdown: Shutdown) -> OrchestratorResult<i32> {
    let label = EnsLabel::parse(&args.label)?;
    let chain_id = config.network.chain_id;
    let funder = load_wallet(FUNDER_KEY_ENV_VAR, chain_id)?;
    let holder = load_wallet(HOLDER_KEY_ENV_VAR, chain_id)?;
    let relay_auth = match load_wallet(RELAY_AUTH_KEY_ENV_VAR, chain_id) {
        Ok(wallet) => wallet,
        Err(OrchestratorError::ConfigMissing(_)) => funder.clone(),
        Err(e) => return Err(e),
    };
    require_rpc(config)?;

    let keys = RescueKeys {
        funder,
        holder,
        relay_auth,
    };
    let request = RescueRequest {
        label,
        new_owner: args.new_owner,
        expected_holder: args.expected_holder,
        relay_url: args.relay_url.clone(),
    };

    let report = run_rescue(config, keys, request, shutdown, |attempt| println!("{}", attempt)).await?;
    if let Some(attempt) = report.included() {
        println!(
            "rescued {} after {} attempt(s): {}",
            args.label,
            report.attempts.len(),
            attempt.outcome
        );
    }
    Ok(0)
}

/// `status`: read-only listing of stored commitments.
pub async fn status(config: &OrchestratorConfig, args: &StatusArgs) -> OrchestratorResult<i32> {
    let store = CommitmentStore::new(config.store.resolve_dir());

    let min_age = match require_rpc(config) {
        Ok(client) => {
            let gateway = EnsGateway::read_only(client, EnsContracts::from_config(&config.ens)?);
            match gateway.min_commitment_age().await {
                Ok(age) => Some(age),
                Err(e) => {
                    tracing::warn!(error = %e, "Minimum commitment age unavailable; reveal times omitted");
                    None
                }
            }
        }
        Err(_) => None,
    };

    println!("store: {}", store.dir().display());
    let reports = status_reports(&store, &args.names, min_age);
    for report in &reports {
        println!("{}", report);
    }
    Ok(0)
}
