//! Core bot engine.
//!
//! One evaluation cycle end-to-end: quote both legs, evaluate the round
//! trip, and on a profitable delta merge, assemble, resolve lookup
//! tables, and submit. The loop is single-threaded by design — at most
//! one attempt is in flight per iteration, and nothing (quotes,
//! blockhash, lookup tables) is carried across cycles.

pub mod assembler;
pub mod opportunity;

use std::sync::Arc;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::block_engine::tx::{SubmissionResult, TxSubmitter};
use crate::common::config::Config;
use crate::error::{BotError, Result};
use crate::library::jupiter::JupiterClient;
use crate::library::lookup::resolve_lookup_tables;

pub struct Engine {
    config: Config,
    wallet: Arc<Keypair>,
    rpc: Arc<RpcClient>,
    jupiter: JupiterClient,
    submitter: TxSubmitter,
}

impl Engine {
    pub fn new(config: Config, wallet: Arc<Keypair>, rpc: Arc<RpcClient>) -> Self {
        let jupiter = JupiterClient::new(
            config.quote_url.clone(),
            config.swap_instruction_url.clone(),
        );
        let submitter = TxSubmitter::new(rpc.clone(), wallet.clone(), config.bundle_relay_url.clone());
        Self {
            config,
            wallet,
            rpc,
            jupiter,
            submitter,
        }
    }

    /// Loop until cancelled. A cycle failure is logged and swallowed; the
    /// fixed delay runs after every cycle regardless of outcome.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            input_mint = %self.config.input_mint,
            intermediate_mint = %self.config.intermediate_mint,
            trade_amount = self.config.trade_amount,
            min_profit_lamports = self.config.min_profit_lamports,
            landing_mode = %self.config.landing_mode,
            "engine started"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.run_cycle().await {
                Ok(Some(result)) => {
                    info!(channel = %result.channel, identifier = %result.identifier, "cycle submitted");
                }
                Ok(None) => {}
                Err(e) => {
                    error!("cycle failed: {}", e);
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(self.config.cycle_delay) => {}
            }
        }

        info!("engine stopped");
    }

    /// One evaluation cycle. Returns `None` when the round trip did not
    /// clear the profit threshold.
    async fn run_cycle(&self) -> Result<Option<SubmissionResult>> {
        let start = Instant::now();

        // Leg B's input depends on leg A's output, so the two quotes are
        // inherently sequential.
        let leg_a = self
            .jupiter
            .get_quote(
                &self.config.input_mint,
                &self.config.intermediate_mint,
                self.config.trade_amount,
                &self.config.quote,
            )
            .await?;

        let leg_a_out = leg_a
            .out_amount
            .parse::<u64>()
            .map_err(|e| BotError::QuoteUnavailable(format!("non-numeric outAmount: {}", e)))?;

        let leg_b = self
            .jupiter
            .get_quote(
                &self.config.intermediate_mint,
                &self.config.input_mint,
                leg_a_out,
                &self.config.quote,
            )
            .await?;

        let opportunity =
            opportunity::evaluate(&leg_a, &leg_b, self.config.min_profit_lamports)?;

        if !opportunity.profitable {
            debug!(delta = opportunity.delta, "below profit threshold");
            return Ok(None);
        }

        info!(
            delta = opportunity.delta,
            tip = opportunity.tip,
            "profitable round trip detected"
        );

        let merged = opportunity::merge_quotes(
            &leg_a,
            &leg_b,
            self.config.trade_amount,
            opportunity.tip,
        );

        let instruction_set = assembler::assemble(
            &self.jupiter,
            &merged,
            &self.wallet.pubkey(),
            opportunity.tip,
            &self.config.tip_account,
        )
        .await?;

        let lookup_tables =
            resolve_lookup_tables(&self.rpc, &instruction_set.lookup_table_addresses).await?;

        let result = self
            .submitter
            .submit(
                instruction_set.instructions,
                &lookup_tables,
                self.config.landing_mode,
            )
            .await?;

        info!(
            slot = merged.context_slot,
            latency_ms = start.elapsed().as_millis() as u64,
            "cycle completed"
        );

        Ok(Some(result))
    }
}
