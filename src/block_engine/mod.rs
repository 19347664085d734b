//! Transaction landing.

pub mod tx;
