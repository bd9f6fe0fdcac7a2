//! Core type definitions for ledger primitives.
//!
//! - `Hash`: variable-length SHA-256 digests
//! - `Encode`: the canonical big-endian byte layout that gets hashed

pub mod encoding;
pub mod hash;
