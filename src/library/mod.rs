//! Clients for external services: the swap-routing HTTP API, on-chain
//! lookup-table resolution, and the smart-broadcast sender.

pub mod jupiter;
pub mod lookup;
pub mod smart_sender;
