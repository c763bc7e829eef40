//! `ens-orchestrator` binary.

use clap::Parser;

use ens_orchestrator::cli::{self, Cli, Command};
use ens_orchestrator::config::{load_config, ConfigError};
use ens_orchestrator::lifecycle::signals::spawn_interrupt_handler;
use ens_orchestrator::observability::init_logging;
use ens_orchestrator::{OrchestratorError, Shutdown};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging("info", cli.log_format);
            report_config_error(&e);
            std::process::exit(OrchestratorError::Config(e).exit_code());
        }
    };
    if let Command::Rescue(args) = &cli.command {
        args.apply_to(&mut config);
    }

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    let format = if config.observability.json_logs {
        ens_orchestrator::observability::LogFormat::Json
    } else {
        cli.log_format
    };
    init_logging(&level, format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        chain_id = config.network.chain_id,
        "ens-orchestrator starting"
    );

    let shutdown = Shutdown::new();
    spawn_interrupt_handler(shutdown.clone());

    let result = match &cli.command {
        Command::Register(args) => cli::register(&config, args, shutdown).await,
        Command::Rescue(args) => cli::rescue(&config, args, shutdown).await,
        Command::Status(args) => cli::status(&config, args).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Run failed");
            eprintln!("error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn report_config_error(error: &ConfigError) {
    match error {
        ConfigError::Validation(errors) => {
            for e in errors {
                tracing::error!(field = %e.field, message = %e.message, "Invalid configuration");
            }
        }
        other => tracing::error!(error = %other, "Failed to load configuration"),
    }
    eprintln!("configuration error: {}", error);
}
