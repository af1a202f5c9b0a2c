// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SIDEREAL Registry Node
//!
//! Entry point for the `sidereal-node` binary. Parses CLI arguments,
//! initializes logging and metrics, bootstraps the chain, and serves the
//! REST API plus the Prometheus endpoint.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the registry node
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use sidereal_ledger::registry::{Chain, ChainConfig};

use cli::{Commands, SiderealNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SiderealNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full registry node: REST API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, args.log_format);

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        challenge_window_secs = args.challenge_window_secs,
        "starting sidereal-node"
    );

    // --- Ledger ---
    let config = ChainConfig {
        challenge_window: Duration::from_secs(args.challenge_window_secs),
    };
    let chain = Arc::new(Chain::new(config));
    chain
        .ensure_genesis()
        .await
        .context("failed to bootstrap the genesis block")?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());
    node_metrics.chain_height.set(chain.height().await);
    node_metrics.blocks_appended_total.inc(); // genesis

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (registry {})",
            env!("CARGO_PKG_VERSION"),
            sidereal_ledger::config::REGISTRY_VERSION,
        ),
        chain: Arc::clone(&chain),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("sidereal-node stopped");
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = raw_http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP/1.1 GET over a plain TCP stream.
///
/// The status endpoint only ever lives on the node's own plain-HTTP port,
/// so a full HTTP client dependency is not worth carrying for one request.
async fn raw_http_get(url: &str) -> Result<String> {
    let (host, port, path) = split_url(url)?;

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Splits `http://host[:port]/path` into its parts.
///
/// Only plain HTTP is supported; the node does not terminate TLS itself.
fn split_url(url: &str) -> Result<(String, u16, String)> {
    if url.starts_with("https://") {
        anyhow::bail!("https is not supported; point --rpc-url at the plain-HTTP RPC port");
    }
    let rest = url.strip_prefix("http://").unwrap_or(url);

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.rsplit_once(':') {
        Some((h, p)) => {
            let port = p
                .parse::<u16>()
                .with_context(|| format!("bad port in URL: {p}"))?;
            (h.to_string(), port)
        }
        None => (authority.to_string(), 80),
    };

    Ok((host, port, path.to_string()))
}

/// Prints version information to stdout.
fn print_version() {
    println!("sidereal-node {}", env!("CARGO_PKG_VERSION"));
    println!("registry      {}", sidereal_ledger::config::REGISTRY_VERSION);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
