//! Hash-chained ledger library.
//!
//! Provides proof-of-work blocks, the verified ledger, and an interactive console.

pub mod config;
pub mod console;
pub mod core;
pub mod types;
pub mod utils;
