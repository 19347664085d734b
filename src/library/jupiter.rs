use std::str::FromStr;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use tokio::time::Duration;
use tracing::debug;

use crate::error::{BotError, Result};

/// Pass-through routing constraints forwarded verbatim to the quote
/// endpoint. Their effect is the routing service's business.
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub only_direct_routes: bool,
    pub slippage_bps: u64,
    pub max_accounts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    #[serde(rename = "inputMint")]
    pub input_mint: String,
    #[serde(rename = "inAmount")]
    pub in_amount: String,
    #[serde(rename = "outputMint")]
    pub output_mint: String,
    #[serde(rename = "outAmount")]
    pub out_amount: String,
    #[serde(rename = "otherAmountThreshold")]
    pub other_amount_threshold: String,
    #[serde(rename = "swapMode", default)]
    pub swap_mode: String,
    #[serde(rename = "slippageBps", default)]
    pub slippage_bps: u64,
    #[serde(rename = "platformFee", default)]
    pub platform_fee: Option<PlatformFee>,
    #[serde(rename = "priceImpactPct")]
    pub price_impact_pct: String,
    #[serde(rename = "routePlan")]
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(rename = "contextSlot", default)]
    pub context_slot: u64,
    /// Anything else the quote service returned. Carried verbatim so the
    /// merged quote posted back to the swap-instruction endpoint is not a
    /// lossy round trip of the original response.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformFee {
    pub amount: String,
    #[serde(rename = "feeBps")]
    pub fee_bps: u64,
}

/// One routing hop. The contents are opaque to this bot; only the order
/// in which hops appear matters when two legs are concatenated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlanStep {
    #[serde(rename = "swapInfo")]
    pub swap_info: serde_json::Value,
    pub percent: u8,
}

#[derive(Debug, Serialize)]
struct SwapInstructionsRequest<'a> {
    #[serde(rename = "userPublicKey")]
    user_public_key: String,
    #[serde(rename = "wrapAndUnwrapSol")]
    wrap_and_unwrap_sol: bool,
    #[serde(rename = "useSharedAccounts")]
    use_shared_accounts: bool,
    #[serde(rename = "computeUnitPriceMicroLamports")]
    compute_unit_price_micro_lamports: u64,
    #[serde(rename = "dynamicComputeUnitLimit")]
    dynamic_compute_unit_limit: bool,
    #[serde(rename = "skipUserAccountsRpcCalls")]
    skip_user_accounts_rpc_calls: bool,
    #[serde(rename = "quoteResponse")]
    quote_response: &'a QuoteResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapInstructionsResponse {
    #[serde(rename = "computeUnitLimit")]
    pub compute_unit_limit: u32,
    #[serde(rename = "setupInstructions", default)]
    pub setup_instructions: Vec<RawInstruction>,
    #[serde(rename = "swapInstruction")]
    pub swap_instruction: RawInstruction,
    #[serde(rename = "addressLookupTableAddresses", default)]
    pub address_lookup_table_addresses: Vec<String>,
}

/// Wire form of an instruction as the swap-instruction service returns
/// it: base58 addresses and a base64 data payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInstruction {
    #[serde(rename = "programId")]
    pub program_id: String,
    pub accounts: Vec<RawAccountMeta>,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAccountMeta {
    pub pubkey: String,
    #[serde(rename = "isSigner")]
    pub is_signer: bool,
    #[serde(rename = "isWritable")]
    pub is_writable: bool,
}

impl RawInstruction {
    /// Convert the wire encoding into a native instruction.
    pub fn decode(&self) -> Result<Instruction> {
        let program_id = Pubkey::from_str(&self.program_id)
            .map_err(|e| BotError::InstructionService(format!("bad program id: {}", e)))?;
        let accounts = self
            .accounts
            .iter()
            .map(|meta| {
                let pubkey = Pubkey::from_str(&meta.pubkey)
                    .map_err(|e| BotError::InstructionService(format!("bad account key: {}", e)))?;
                Ok(AccountMeta {
                    pubkey,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let data = base64::decode(&self.data)
            .map_err(|e| BotError::InstructionService(format!("bad instruction data: {}", e)))?;
        Ok(Instruction {
            program_id,
            accounts,
            data,
        })
    }
}

/// HTTP client for the quote and swap-instruction endpoints.
#[derive(Clone)]
pub struct JupiterClient {
    client: Client,
    quote_url: String,
    swap_instruction_url: String,
}

impl JupiterClient {
    pub fn new(quote_url: String, swap_instruction_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            quote_url,
            swap_instruction_url,
        }
    }

    /// Fetch a quote for one leg of the round trip.
    pub async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        config: &QuoteConfig,
    ) -> Result<QuoteResponse> {
        let response = self
            .client
            .get(&self.quote_url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount.to_string()),
                ("onlyDirectRoutes", config.only_direct_routes.to_string()),
                ("slippageBps", config.slippage_bps.to_string()),
                ("maxAccounts", config.max_accounts.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BotError::QuoteUnavailable(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let quote: QuoteResponse = serde_json::from_str(&body).map_err(|e| {
            BotError::QuoteUnavailable(format!(
                "malformed payload: {} ({})",
                e,
                &body[..std::cmp::min(200, body.len())]
            ))
        })?;

        debug!(
            input_mint,
            output_mint,
            in_amount = %quote.in_amount,
            out_amount = %quote.out_amount,
            slot = quote.context_slot,
            "quote received"
        );

        Ok(quote)
    }

    /// Request executable instructions for a (merged) quote.
    pub async fn swap_instructions(
        &self,
        quote: &QuoteResponse,
        user_public_key: &Pubkey,
    ) -> Result<SwapInstructionsResponse> {
        let request = SwapInstructionsRequest {
            user_public_key: user_public_key.to_string(),
            wrap_and_unwrap_sol: true,
            use_shared_accounts: false,
            compute_unit_price_micro_lamports: 1,
            dynamic_compute_unit_limit: true,
            skip_user_accounts_rpc_calls: true,
            quote_response: quote,
        };

        let response = self
            .client
            .post(&self.swap_instruction_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BotError::InstructionService(format!(
                "status {}: {}",
                status, body
            )));
        }

        let instructions: SwapInstructionsResponse = response
            .json()
            .await
            .map_err(|e| BotError::InstructionService(format!("malformed payload: {}", e)))?;

        debug!(
            compute_unit_limit = instructions.compute_unit_limit,
            setup_count = instructions.setup_instructions.len(),
            lookup_tables = instructions.address_lookup_table_addresses.len(),
            "swap instructions received"
        );

        Ok(instructions)
    }
}
