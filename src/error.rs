//! Error taxonomy for the bot.
//!
//! Every failure inside a cycle maps onto one of these variants so the
//! engine can log the failing step and move on to the next cycle.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// The quote service returned a non-success status or a payload we
    /// could not parse.
    #[error("quote unavailable: {0}")]
    QuoteUnavailable(String),

    /// The swap-instruction service rejected the merged quote or returned
    /// an undecodable instruction.
    #[error("swap-instruction service error: {0}")]
    InstructionService(String),

    /// An address lookup table referenced by the swap did not resolve to
    /// an on-chain account.
    #[error("lookup table not found: {0}")]
    LookupTableNotFound(Pubkey),

    /// The bundle relay rejected the submission or omitted a bundle id.
    #[error("bundle relay submission failed: {0}")]
    RelaySubmission(String),

    /// The smart-broadcast sender failed; its internal error is carried
    /// opaquely.
    #[error("smart broadcast submission failed: {0}")]
    BroadcastSubmission(String),

    /// Message compilation or signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
