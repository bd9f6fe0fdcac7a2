//! Proof-of-work acceptance policies.
//!
//! Provides the [`HashValidator`] trait the ledger is generic over and
//! [`LeadingZeroBytes`] as the reference difficulty policy.

use crate::types::hash::Hash;

/// Default number of leading zero bytes a block hash must carry.
pub const DEFAULT_DIFFICULTY: usize = 3;

/// Decides whether a block hash meets the ledger's difficulty.
///
/// The decision must be a pure function of the hash. Implementations must be
/// thread-safe so a ledger can be shared behind a lock.
pub trait HashValidator: Send + Sync {
    /// Returns true if `hash` is acceptable.
    fn accepts(&self, hash: &Hash) -> bool;
}

impl<F> HashValidator for F
where
    F: Fn(&Hash) -> bool + Send + Sync,
{
    fn accepts(&self, hash: &Hash) -> bool {
        self(hash)
    }
}

/// Accepts hashes whose first `count` bytes are all zero.
///
/// Each extra byte multiplies the expected mining work by 256.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeadingZeroBytes {
    count: usize,
}

impl LeadingZeroBytes {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Default for LeadingZeroBytes {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}

impl HashValidator for LeadingZeroBytes {
    fn accepts(&self, hash: &Hash) -> bool {
        hash.len() >= self.count && hash.leading_zero_bytes() >= self.count
    }
}
