// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ClaimSeal Node
//!
//! Entry point for the `claimseal-node` binary. Parses CLI arguments,
//! initializes logging, and dispatches to a subcommand:
//!
//! - `serve`   — HTTP API plus Prometheus metrics
//! - `init`    — load or generate the key pair, print its location
//! - `issue`   — sign a claim from a file or stdin
//! - `verify`  — check a request message from a file or stdin
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;

use claimseal_protocol::config::{TOKEN_ALG, TOKEN_TYPE};
use claimseal_protocol::keystore::KeyPairManager;
use claimseal_protocol::token::{RequestMessage, TokenService};

use cli::{ClaimsealCli, Commands};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = ClaimsealCli::parse();

    if !matches!(cli.command, Commands::Version) {
        logging::init_logging(
            logging::DEFAULT_FILTER,
            LogFormat::from_str_lossy(&cli.log_format),
        );
    }

    match cli.command {
        Commands::Serve(args) => serve(args).await.map(|_| ExitCode::SUCCESS),
        Commands::Init(args) => init_keys(args).map(|_| ExitCode::SUCCESS),
        Commands::Issue(args) => issue(args).map(|_| ExitCode::SUCCESS),
        Commands::Verify(args) => verify(args),
        Commands::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Builds the token service for a set of key options.
fn token_service(keys: &cli::KeyArgs) -> TokenService {
    TokenService::new(Arc::new(KeyPairManager::new(keys.to_config())))
}

/// Ensures the key pair, then serves the API and metrics until a shutdown
/// signal arrives.
async fn serve(args: cli::ServeArgs) -> Result<()> {
    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        key_dir = %args.keys.key_dir.display(),
        "starting claimseal-node"
    );

    // --- Key material ---
    // Nothing can be signed without it, so failure here is fatal.
    let tokens = token_service(&args.keys);
    let pair = tokens.key_pair().with_context(|| {
        format!(
            "failed to load or generate key pair in {}",
            args.keys.key_dir.display()
        )
    })?;
    tracing::info!(
        fingerprint = %pair.public_key().fingerprint(),
        bits = pair.key_size_bits(),
        "signing key ready"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        tokens,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = api::create_metrics_router(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
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
            tracing::info!("shutdown signal received, stopping");
        }
    }

    tracing::info!("claimseal-node stopped");
    Ok(())
}

/// Loads or generates the key pair and prints where it lives.
fn init_keys(args: cli::InitArgs) -> Result<()> {
    let tokens = token_service(&args.keys);
    let existed = tokens.key_store().exists();
    let pair = tokens.key_pair().with_context(|| {
        format!(
            "failed to load or generate key pair in {}",
            args.keys.key_dir.display()
        )
    })?;
    let config = tokens.key_store().config();

    println!(
        "Key pair {}.",
        if existed { "loaded" } else { "generated" }
    );
    println!("  Key directory : {}", config.dir().display());
    println!("  Public key    : {}", config.public_key_path().display());
    println!("  Private key   : {}", config.private_key_path().display());
    println!("  Algorithm     : {} {}", pair.algorithm(), pair.key_size_bits());
    println!("  Fingerprint   : {}", pair.public_key().fingerprint());
    println!();
    println!("{}", pair.public_key_base58()?);

    Ok(())
}

/// Issues a request message for the claim and prints it.
fn issue(args: cli::IssueArgs) -> Result<()> {
    let claim = read_input(args.claim.as_deref()).context("failed to read claim")?;
    let tokens = token_service(&args.keys);

    let request = tokens
        .issue_request(&claim)
        .context("failed to issue request message")?;
    println!("{}", request.to_json_pretty()?);
    Ok(())
}

/// Verifies a request message and prints the outcome. Exits non-zero on a
/// mismatch.
fn verify(args: cli::VerifyArgs) -> Result<ExitCode> {
    let text = read_input(args.request.as_deref()).context("failed to read request message")?;
    let request = RequestMessage::from_json(&text).context("invalid request message")?;
    let tokens = token_service(&args.keys);

    let report = tokens
        .verify_request(&request)
        .context("failed to verify request message")?;
    println!("{}", report.message);

    Ok(if report.verified {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Reads the whole of `path`, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("claimseal-node {}", env!("CARGO_PKG_VERSION"));
    println!("token format   {}/{}", TOKEN_TYPE, TOKEN_ALG);
    println!("rustc          {}", rustc_version());
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
