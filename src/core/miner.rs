//! Proof-of-work nonce search.
//!
//! Candidate nonces are drawn uniformly from the full 64-bit space. The fixed
//! part of the block preimage is hashed once and the digest state is cloned
//! for each candidate, so a search attempt costs one 8-byte update plus the
//! final SHA-256 rounds.

use crate::core::validator::HashValidator;
use crate::debug;
use crate::types::encoding::Encode;
use crate::types::hash::{Hash, HashBuilder};
use hashchain_derive::Error;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_core::{OsRng, RngCore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors that stop a nonce search.
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("no acceptable nonce found within {attempts} attempts")]
    Exhausted { attempts: u64 },

    #[error("mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("could not seed the nonce generator: {0}")]
    Entropy(#[from] rand_core::Error),
}

/// Bounds on a nonce search.
///
/// The default places no bounds: the search runs until a nonce is found.
#[derive(Clone, Debug, Default)]
pub struct MiningOptions {
    max_attempts: Option<u64>,
    cancel: Option<Arc<AtomicBool>>,
}

impl MiningOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives up with [`MiningError::Exhausted`] after `attempts` candidates.
    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Stops with [`MiningError::Cancelled`] once `flag` is set.
    ///
    /// The flag is polled before every attempt.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn max_attempts(&self) -> Option<u64> {
        self.max_attempts
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Creates a nonce generator seeded from the operating system.
pub fn os_seeded_rng() -> Result<StdRng, MiningError> {
    Ok(StdRng::from_rng(OsRng)?)
}

/// Searches for a nonce whose hash, appended to `prefix`, the validator accepts.
///
/// Returns the nonce together with the resulting hash.
pub fn search<V, R>(
    prefix: &HashBuilder,
    validator: &V,
    options: &MiningOptions,
    rng: &mut R,
) -> Result<(u64, Hash), MiningError>
where
    V: HashValidator + ?Sized,
    R: RngCore + ?Sized,
{
    let mut attempts: u64 = 0;
    loop {
        if options.is_cancelled() {
            return Err(MiningError::Cancelled { attempts });
        }
        if options.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(MiningError::Exhausted { attempts });
        }

        let nonce = rng.next_u64();
        let mut h = prefix.clone();
        nonce.encode(&mut h);
        let hash = h.finalize();
        attempts += 1;

        if validator.accepts(&hash) {
            debug!("Found nonce {} after {} attempts", nonce, attempts);
            return Ok((nonce, hash));
        }
    }
}
