//! # CLI Interface
//!
//! Defines the command-line argument structure for `covault-node` using
//! `clap` derive. Supports four subcommands: `run`, `init`, `status`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Covault platform node.
///
/// Hosts the campaign vault registry and the dev asset ledger, serves
/// the REST API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "covault-node",
    about = "Covault platform node",
    version,
    propagate_version = true
)]
pub struct CovaultNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the covault-node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the platform node.
    Run(RunArgs),
    /// Initialize a data directory and generate a designated-signer
    /// keypair.
    Init(InitArgs),
    /// Query the status of a running node via its REST endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "COVAULT_RPC_PORT", default_value_t = 9651)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "COVAULT_METRICS_PORT", default_value_t = 9652)]
    pub metrics_port: u16,

    /// Chain to run against: mainnet, testnet, or devnet.
    #[arg(long, env = "COVAULT_CHAIN", default_value = "devnet")]
    pub chain: String,

    /// Platform operator address — administers the dev asset ledger and
    /// is the default vault admin.
    #[arg(long, env = "COVAULT_OPERATOR", default_value = "operator-dev")]
    pub operator: String,

    /// Hex-encoded Ed25519 secret key for the designated signer.
    ///
    /// When omitted, a fresh keypair is generated at startup and its
    /// public key logged. **Never pass this flag in production** — use a
    /// key file and the environment variable instead.
    #[arg(long, env = "COVAULT_SIGNER_KEY")]
    pub signer_key: Option<String>,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "COVAULT_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "COVAULT_DATA_DIR", default_value = "~/.covault")]
    pub data_dir: PathBuf,

    /// Chain to configure for: mainnet, testnet, or devnet.
    #[arg(long, default_value = "devnet")]
    pub chain: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// REST endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9651")]
    pub rpc_url: String,
}
