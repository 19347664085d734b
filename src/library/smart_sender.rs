//! Smart-broadcast sender.
//!
//! The broadcast landing channel delegates to this primitive, which owns
//! fee estimation, compute-unit sizing, bounded resends, and confirmation
//! polling. Callers hand it raw instructions without any compute-budget
//! directives; it inserts its own.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::AddressLookupTableAccount,
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, warn};

const MAX_SEND_ATTEMPTS: usize = 3;
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(400);
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);
const FALLBACK_COMPUTE_UNIT_PRICE: u64 = 20_000;
const SIMULATION_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;

#[derive(Clone)]
pub struct SmartSender {
    rpc: Arc<RpcClient>,
}

impl SmartSender {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    /// Send `instructions` as one v0 transaction, retrying and polling
    /// until the cluster confirms it or the attempt budget runs out.
    pub async fn send_smart_transaction(
        &self,
        instructions: Vec<Instruction>,
        keypair: &Keypair,
        lookup_tables: &[AddressLookupTableAccount],
        recent_blockhash: Hash,
    ) -> Result<Signature> {
        let unit_price = self.estimate_compute_unit_price().await;

        // Size the unit limit from a simulation run with a generous cap.
        let provisional = self.with_budget(
            &instructions,
            unit_price,
            SIMULATION_COMPUTE_UNIT_LIMIT,
            keypair,
            lookup_tables,
            recent_blockhash,
        )?;
        let unit_limit = self.simulate_unit_limit(&provisional).await?;

        // Sign exactly once. Every retry resends these same bytes: the
        // cluster dedups by signature, so a resend can never execute the
        // swap twice. Once the blockhash expires the attempt is abandoned
        // and the next cycle starts over with fresh quotes.
        let tx = self.with_budget(
            &instructions,
            unit_price,
            unit_limit,
            keypair,
            lookup_tables,
            recent_blockhash,
        )?;
        let signature = tx.signatures[0];

        for attempt in 1..=MAX_SEND_ATTEMPTS {
            match self.rpc.send_transaction(&tx).await {
                Ok(_) => {
                    debug!(%signature, attempt, unit_price, unit_limit, "broadcast attempt sent");
                }
                Err(e) if attempt == 1 => return Err(e.into()),
                // A resend is rejected when the first send already reached
                // the cluster; keep polling the signature instead.
                Err(e) => debug!(%signature, attempt, "resend rejected, polling anyway: {}", e),
            }

            match self.await_confirmation(&signature).await? {
                Confirmation::Confirmed => return Ok(signature),
                Confirmation::Failed(err) => {
                    return Err(anyhow!("transaction {} failed on-chain: {}", signature, err))
                }
                Confirmation::TimedOut => {
                    let still_valid = self
                        .rpc
                        .is_blockhash_valid(&recent_blockhash, CommitmentConfig::processed())
                        .await?;
                    if !still_valid {
                        return Err(anyhow!(
                            "blockhash expired before {} confirmed; abandoning",
                            signature
                        ));
                    }
                    warn!(%signature, attempt, "confirmation timed out, resending the same transaction");
                }
            }
        }

        Err(anyhow!(
            "transaction {} not confirmed after {} attempts",
            signature,
            MAX_SEND_ATTEMPTS
        ))
    }

    fn with_budget(
        &self,
        instructions: &[Instruction],
        unit_price: u64,
        unit_limit: u32,
        keypair: &Keypair,
        lookup_tables: &[AddressLookupTableAccount],
        blockhash: Hash,
    ) -> Result<VersionedTransaction> {
        let mut all = Vec::with_capacity(instructions.len() + 2);
        all.push(ComputeBudgetInstruction::set_compute_unit_price(unit_price));
        all.push(ComputeBudgetInstruction::set_compute_unit_limit(unit_limit));
        all.extend_from_slice(instructions);

        let message = v0::Message::try_compile(&keypair.pubkey(), &all, lookup_tables, blockhash)?;
        let tx = VersionedTransaction::try_new(VersionedMessage::V0(message), &[keypair])?;
        Ok(tx)
    }

    /// Median of the cluster's recent non-zero prioritization fees.
    async fn estimate_compute_unit_price(&self) -> u64 {
        match self.rpc.get_recent_prioritization_fees(&[]).await {
            Ok(fees) => {
                let mut nonzero: Vec<u64> = fees
                    .iter()
                    .map(|f| f.prioritization_fee)
                    .filter(|&f| f > 0)
                    .collect();
                if nonzero.is_empty() {
                    return FALLBACK_COMPUTE_UNIT_PRICE;
                }
                nonzero.sort_unstable();
                nonzero[nonzero.len() / 2]
            }
            Err(e) => {
                warn!("prioritization fee lookup failed, using fallback: {}", e);
                FALLBACK_COMPUTE_UNIT_PRICE
            }
        }
    }

    /// Simulate and return consumed units plus 10% headroom.
    async fn simulate_unit_limit(&self, tx: &VersionedTransaction) -> Result<u32> {
        let sim = self.rpc.simulate_transaction(tx).await?;
        if let Some(err) = sim.value.err {
            return Err(anyhow!("simulation failed: {:?}", err));
        }
        let limit = match sim.value.units_consumed {
            Some(units) => ((units * 110 / 100) as u32).max(1_000),
            None => SIMULATION_COMPUTE_UNIT_LIMIT,
        };
        Ok(limit)
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<Confirmation> {
        let deadline = Instant::now() + CONFIRM_TIMEOUT;
        while Instant::now() < deadline {
            match self.rpc.get_signature_status(signature).await? {
                Some(Ok(())) => return Ok(Confirmation::Confirmed),
                Some(Err(err)) => return Ok(Confirmation::Failed(format!("{:?}", err))),
                None => sleep(CONFIRM_POLL_INTERVAL).await,
            }
        }
        Ok(Confirmation::TimedOut)
    }
}

enum Confirmation {
    Confirmed,
    Failed(String),
    TimedOut,
}
