use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use token_gateway::blockchain::{RpcChainClient, Wallet};
use token_gateway::config::loader::{load_or_default, CONFIG_PATH_ENV_VAR};
use token_gateway::lifecycle::{build_state, signals, Shutdown};
use token_gateway::observability::{logging, metrics};
use token_gateway::{GatewayError, HttpServer};

/// HTTP gateway for a token contract.
#[derive(Parser, Debug)]
#[command(name = "token-gateway", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = CONFIG_PATH_ENV_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env must be loaded before anything reads the environment.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("token-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.blockchain.rpc_url,
        chain_id = config.blockchain.chain_id,
        contract = %config.token.contract_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut client = RpcChainClient::new(config.blockchain.clone())?;
    match client.select_provider().await {
        Ok(chain_id) => tracing::info!(
            chain_id = chain_id.0,
            rpc_url = %client.active_url(),
            "Connected to chain"
        ),
        Err(e @ GatewayError::Config(_)) => return Err(e.into()),
        Err(e) => tracing::warn!(error = %e, "No RPC provider reachable; continuing with primary"),
    }

    let wallet = Wallet::from_env(config.blockchain.chain_id)?;
    let state = build_state(&config, Arc::new(client), wallet)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    HttpServer::new(&config, state)
        .run(listener, shutdown.wait())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
