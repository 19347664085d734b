//! Environment-driven configuration.
//!
//! Everything comes from the process environment (optionally seeded from
//! a `.env` file); there are no CLI flags. Missing credentials are fatal
//! before the loop starts, per the startup contract.

use std::str::FromStr;
use std::sync::Arc;
use std::{env, fmt};

use anyhow::{anyhow, Context, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Keypair};
use tokio::time::Duration;

use crate::library::jupiter::QuoteConfig;

pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Default tip recipient, one of the public Jito tip accounts. Overridable
/// through `TIP_ACCOUNT`.
pub const DEFAULT_TIP_ACCOUNT: &str = "Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY";

const DEFAULT_QUOTE_URL: &str = "http://127.0.0.1:8080/quote";
const DEFAULT_SWAP_INSTRUCTION_URL: &str = "http://127.0.0.1:8080/swap-instructions";
const DEFAULT_BUNDLE_RELAY_URL: &str =
    "https://frankfurt.mainnet.block-engine.jito.wtf/api/v1/bundles";

/// Which landing channel carries the signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionLandingMode {
    Bundle,
    Broadcast,
}

impl Default for TransactionLandingMode {
    fn default() -> Self {
        TransactionLandingMode::Bundle
    }
}

impl FromStr for TransactionLandingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "0" | "bundle" => Ok(TransactionLandingMode::Bundle),
            "1" | "broadcast" => Ok(TransactionLandingMode::Broadcast),
            _ => Err(format!(
                "Invalid transaction landing mode: {}. Use 'bundle' or 'broadcast'",
                s
            )),
        }
    }
}

impl fmt::Display for TransactionLandingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionLandingMode::Bundle => write!(f, "bundle"),
            TransactionLandingMode::Broadcast => write!(f, "broadcast"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub quote_url: String,
    pub swap_instruction_url: String,
    pub bundle_relay_url: String,
    pub input_mint: String,
    pub intermediate_mint: String,
    /// Leg-A input, in base units of the input mint.
    pub trade_amount: u64,
    /// Strict lower bound a round-trip delta must exceed.
    pub min_profit_lamports: u64,
    pub quote: QuoteConfig,
    pub tip_account: Pubkey,
    pub landing_mode: TransactionLandingMode,
    pub cycle_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let rpc_url = match env::var("RPC_HTTP") {
            Ok(url) => url,
            Err(_) => {
                let api_key = import_env_var("HELIUS_API_KEY")?;
                format!("https://staked.helius-rpc.com?api-key={}", api_key)
            }
        };

        let tip_account = env_or("TIP_ACCOUNT", DEFAULT_TIP_ACCOUNT);
        let tip_account = Pubkey::from_str(&tip_account)
            .map_err(|e| anyhow!("TIP_ACCOUNT is not a valid address: {}", e))?;

        let landing_mode = env_or("TRANSACTION_LANDING_SERVICE", "bundle")
            .parse::<TransactionLandingMode>()
            .map_err(|e| anyhow!(e))?;

        Ok(Self {
            rpc_url,
            quote_url: env_or("QUOTE_API_URL", DEFAULT_QUOTE_URL),
            swap_instruction_url: env_or("SWAP_INSTRUCTION_API_URL", DEFAULT_SWAP_INSTRUCTION_URL),
            bundle_relay_url: env_or("BUNDLE_RELAY_URL", DEFAULT_BUNDLE_RELAY_URL),
            input_mint: env_or("INPUT_MINT", WSOL_MINT),
            intermediate_mint: env_or("INTERMEDIATE_MINT", USDC_MINT),
            trade_amount: parse_env_or("TRADE_AMOUNT", 10_000_000)?,
            min_profit_lamports: parse_env_or("MIN_PROFIT_LAMPORTS", 3_000)?,
            quote: QuoteConfig {
                only_direct_routes: parse_env_or("ONLY_DIRECT_ROUTES", false)?,
                slippage_bps: parse_env_or("SLIPPAGE_BPS", 0)?,
                max_accounts: parse_env_or("MAX_ACCOUNTS", 32)?,
            },
            tip_account,
            landing_mode,
            cycle_delay: Duration::from_millis(parse_env_or("CYCLE_DELAY_MS", 200)?),
        })
    }
}

pub fn import_env_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing required environment variable {}", key))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

/// Load the signing keypair from `PRIVATE_KEY` (base58). A bad or missing
/// key terminates startup; no cycle can run without it.
pub fn import_wallet() -> Result<Arc<Keypair>> {
    let priv_key = import_env_var("PRIVATE_KEY")?;
    if priv_key.len() < 85 {
        return Err(anyhow!(
            "PRIVATE_KEY looks malformed: invalid length {}",
            priv_key.len()
        ));
    }
    let wallet = Keypair::from_base58_string(priv_key.as_str());
    Ok(Arc::new(wallet))
}

pub fn create_nonblocking_rpc_client(rpc_url: &str) -> Arc<RpcClient> {
    Arc::new(RpcClient::new_with_timeout_and_commitment(
        rpc_url.to_string(),
        std::time::Duration::from_secs(30),
        CommitmentConfig::processed(),
    ))
}
