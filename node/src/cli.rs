//! # CLI Interface
//!
//! Defines the command-line argument structure for `sidereal-node` using
//! `clap` derive. Supports three subcommands: `run`, `status`, and
//! `version`.

use clap::{Parser, Subcommand};

use sidereal_ledger::config::{DEFAULT_CHALLENGE_WINDOW, DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};

use crate::logging::LogFormat;

/// SIDEREAL star registry node.
///
/// A single-writer registry node. Serves the REST API for ownership
/// challenges, star submissions, and chain lookups, and exposes Prometheus
/// metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "sidereal-node",
    about = "SIDEREAL star registry node",
    version,
    propagate_version = true
)]
pub struct SiderealNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the SIDEREAL node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the registry node.
    Run(RunArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "SIDEREAL_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "SIDEREAL_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Ownership-challenge freshness window in seconds.
    ///
    /// A star submission is rejected once its challenge is this old.
    #[arg(
        long,
        env = "SIDEREAL_CHALLENGE_WINDOW",
        default_value_t = DEFAULT_CHALLENGE_WINDOW.as_secs()
    )]
    pub challenge_window_secs: u64,

    /// Log output format.
    #[arg(long, env = "SIDEREAL_LOG_FORMAT", value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Default log level directives when RUST_LOG is not set.
    #[arg(
        long,
        env = "SIDEREAL_LOG_LEVEL",
        default_value = "sidereal_node=info,sidereal_ledger=info"
    )]
    pub log_level: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub rpc_url: String,
}
