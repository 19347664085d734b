use std::sync::Arc;

use anyhow::Result;
use solana_sdk::signer::Signer;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use solana_roundtrip_bot::common::config::{create_nonblocking_rpc_client, import_wallet, Config};
use solana_roundtrip_bot::engine::Engine;
use solana_roundtrip_bot::utils::logger::init_logger;

/// Main entry point for the round-trip arbitrage bot.
///
/// Startup errors (missing key, bad config) terminate the process; once
/// the loop is running, no single cycle failure ever does. The process
/// runs unattended until interrupted, and ctrl-c stops it cleanly after
/// the in-flight cycle.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = init_logger().map_err(|e| anyhow::anyhow!("logger init failed: {}", e))?;

    info!("Starting Solana round-trip bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let wallet = import_wallet()?;
    info!(payer = %wallet.pubkey(), rpc = %config.rpc_url, "configuration loaded");

    let rpc = create_nonblocking_rpc_client(&config.rpc_url);
    let engine = Arc::new(Engine::new(config, wallet, rpc));

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received, stopping after the current cycle...");
            signal_token.cancel();
        }
    });

    engine.run(shutdown).await;

    info!("Bot shutdown complete");
    Ok(())
}
