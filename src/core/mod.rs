//! Core ledger data structures.
//!
//! - `Transaction`: a named value transfer
//! - `Block`: one transaction bound to its predecessor by a proof-of-work hash
//! - `Ledger`: the verified, append-only chain of blocks

pub mod balances;
pub mod block;
pub mod blockchain;
pub mod miner;
pub mod transaction;
pub mod validator;
