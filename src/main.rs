//! Deposit entrypoint.
//!
//! Signs an EIP-2612 permit for the Bank contract and deposits tokens with a single
//! `depositWithPermit` transaction.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `RPC_URL`, `PRIVATE_KEY`, `BANK_ADDRESS`, `TOKEN_ADDRESS`, `AMOUNT`, `DEADLINE` select the deposit
//! - `RUST_LOG` controls log verbosity
//! - `OTEL_*` variables enable span export when built with the `telemetry` feature

use bank_permit::config::{Config, ConfigError};
use bank_permit::run::run;
use bank_permit::telemetry::Telemetry;
use dotenvy::dotenv;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env variables
    dotenv().ok();

    let config = match Config::load() {
        Ok(config) => config,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let result = match run(&config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "Deposit failed");
            return ExitCode::FAILURE;
        }
    };

    if config.json() {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize deposit result");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
