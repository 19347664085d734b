//! # Solana Round-Trip Bot
//!
//! A trading bot that watches for a round-trip price discrepancy between
//! two mints quoted through a swap-routing service and, when the
//! discrepancy clears a lamport threshold, lands a single atomic
//! transaction executing both legs plus a tip.
//!
//! ## Architecture
//!
//! - `engine`: cycle orchestration, profit evaluation, quote merging, and
//!   instruction assembly
//! - `library`: clients for the quote/swap-instruction API, lookup-table
//!   resolution, and the smart-broadcast sender
//! - `block_engine`: transaction compilation, signing, and the two
//!   landing channels (bundle relay, smart broadcast)
//! - `common`: environment-driven configuration and wallet/RPC setup
//! - `utils`: logging
//!
//! ## Safety
//!
//! This software is experimental and carries significant financial risk.
//! Always test thoroughly on devnet before mainnet deployment.

pub mod block_engine;
pub mod common;
pub mod engine;
pub mod error;
pub mod library;
pub mod utils;

// Re-export commonly used types
pub use common::config::Config;
pub use engine::Engine;
pub use error::BotError;
