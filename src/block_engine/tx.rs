//! Transaction compilation, signing, and dual-channel landing.
//!
//! The two channels share nothing past the blockhash fetch: the bundle
//! path compiles and signs here, then hands the relay an already-sealed
//! transaction; the broadcast path hands raw instructions (minus any
//! compute-budget directives) to the smart sender, which seals its own.

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    compute_budget,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};
use tokio::time::Duration;
use tracing::info;

use crate::common::config::TransactionLandingMode;
use crate::error::{BotError, Result};
use crate::library::smart_sender::SmartSender;

/// Where a submission went and what to look it up by. A bundle identifier
/// is a relay bundle id; a broadcast identifier is a confirmed transaction
/// signature. The two are not interchangeable.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub channel: TransactionLandingMode,
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

/// JSON-RPC client for the bundle relay's `sendBundle` endpoint.
#[derive(Clone)]
pub struct BundleRelayClient {
    client: Client,
    url: String,
}

impl BundleRelayClient {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            url,
        }
    }

    /// Submit one signed transaction as a single-transaction bundle. The
    /// relay's acceptance is the only check; there is no simulation and
    /// no retry.
    pub async fn send_bundle(&self, transaction: &VersionedTransaction) -> Result<String> {
        let serialized = bincode::serialize(transaction)
            .map_err(|e| BotError::RelaySubmission(format!("serialize failed: {}", e)))?;
        let encoded = bs58::encode(serialized).into_string();

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendBundle",
            "params": [[encoded]],
        });

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BotError::RelaySubmission(format!(
                "status {}: {}",
                status, body
            )));
        }

        let relay: RelayResponse = response
            .json()
            .await
            .map_err(|e| BotError::RelaySubmission(format!("malformed response: {}", e)))?;

        relay.result.ok_or_else(|| {
            BotError::RelaySubmission(format!(
                "missing bundle id: {}",
                relay
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no error detail".to_string())
            ))
        })
    }
}

/// Compiles, signs, and lands one transaction per profitable cycle.
pub struct TxSubmitter {
    rpc: Arc<RpcClient>,
    relay: BundleRelayClient,
    smart_sender: SmartSender,
    wallet: Arc<Keypair>,
}

impl TxSubmitter {
    pub fn new(rpc: Arc<RpcClient>, wallet: Arc<Keypair>, bundle_relay_url: String) -> Self {
        let smart_sender = SmartSender::new(rpc.clone());
        Self {
            rpc,
            relay: BundleRelayClient::new(bundle_relay_url),
            smart_sender,
            wallet,
        }
    }

    pub async fn submit(
        &self,
        instructions: Vec<Instruction>,
        lookup_tables: &[AddressLookupTableAccount],
        mode: TransactionLandingMode,
    ) -> Result<SubmissionResult> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;

        match mode {
            TransactionLandingMode::Bundle => {
                let message = v0::Message::try_compile(
                    &self.wallet.pubkey(),
                    &instructions,
                    lookup_tables,
                    recent_blockhash,
                )
                .map_err(|e| BotError::Signing(format!("message compile failed: {}", e)))?;
                let transaction = VersionedTransaction::try_new(
                    VersionedMessage::V0(message),
                    &[self.wallet.as_ref()],
                )
                .map_err(|e| BotError::Signing(e.to_string()))?;

                let bundle_id = self.relay.send_bundle(&transaction).await?;
                info!(bundle_id = %bundle_id, "bundle accepted by relay");

                Ok(SubmissionResult {
                    channel: TransactionLandingMode::Bundle,
                    identifier: bundle_id,
                })
            }
            TransactionLandingMode::Broadcast => {
                // The smart sender manages compute budgeting itself and
                // rejects a caller-supplied directive.
                let filtered = strip_compute_budget(&instructions);
                let signature = self
                    .smart_sender
                    .send_smart_transaction(
                        filtered,
                        &self.wallet,
                        lookup_tables,
                        recent_blockhash,
                    )
                    .await
                    .map_err(|e| BotError::BroadcastSubmission(e.to_string()))?;
                info!(signature = %signature, "broadcast transaction confirmed");

                Ok(SubmissionResult {
                    channel: TransactionLandingMode::Broadcast,
                    identifier: signature.to_string(),
                })
            }
        }
    }
}

/// Drop every compute-budget-program instruction, preserving the relative
/// order of everything else.
pub fn strip_compute_budget(instructions: &[Instruction]) -> Vec<Instruction> {
    instructions
        .iter()
        .filter(|ix| ix.program_id != compute_budget::id())
        .cloned()
        .collect()
}
