//! Blocks: one transaction bound to its predecessor by hash.

use crate::core::miner::{self, MiningError, MiningOptions};
use crate::core::transaction::Transaction;
use crate::core::validator::HashValidator;
use crate::types::encoding::{Encode, EncodeSink};
use crate::types::hash::{Hash, HashBuilder};
use rand_core::RngCore;
use std::fmt;

/// Immutable chain entry.
///
/// The hash is computed once at construction from the other four fields and
/// cannot be set independently. The preimage layout is:
///
/// | field           | bytes                    |
/// |-----------------|--------------------------|
/// | `index`         | 4, big-endian            |
/// | source          | UTF-8, no prefix         |
/// | target          | UTF-8, no prefix         |
/// | amount          | 4, big-endian            |
/// | `previous_hash` | raw digest bytes         |
/// | `nonce`         | 8, big-endian            |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    index: u32,
    transaction: Transaction,
    previous_hash: Hash,
    nonce: u64,
    hash: Hash,
}

impl Block {
    /// Rebuilds a block from a known nonce, computing its hash directly.
    pub fn new(index: u32, transaction: Transaction, previous_hash: Hash, nonce: u64) -> Block {
        let mut h = Self::prefix(index, &transaction, &previous_hash);
        nonce.encode(&mut h);
        let hash = h.finalize();
        Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        }
    }

    /// Mines a block, drawing candidate nonces from an OS-seeded generator.
    pub fn mine<V: HashValidator + ?Sized>(
        index: u32,
        transaction: Transaction,
        previous_hash: Hash,
        validator: &V,
        options: &MiningOptions,
    ) -> Result<Block, MiningError> {
        let mut rng = miner::os_seeded_rng()?;
        Self::mine_with_rng(index, transaction, previous_hash, validator, options, &mut rng)
    }

    /// Mines a block with candidate nonces drawn from `rng`.
    pub fn mine_with_rng<V, R>(
        index: u32,
        transaction: Transaction,
        previous_hash: Hash,
        validator: &V,
        options: &MiningOptions,
        rng: &mut R,
    ) -> Result<Block, MiningError>
    where
        V: HashValidator + ?Sized,
        R: RngCore + ?Sized,
    {
        let prefix = Self::prefix(index, &transaction, &previous_hash);
        let (nonce, hash) = miner::search(&prefix, validator, options, rng)?;
        Ok(Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        })
    }

    /// Digest state after every field except the nonce.
    fn prefix(index: u32, transaction: &Transaction, previous_hash: &Hash) -> HashBuilder {
        let mut h = Hash::sha256();
        index.encode(&mut h);
        transaction.encode(&mut h);
        previous_hash.encode(&mut h);
        h
    }

    /// Builds a block whose stored hash was not derived from its fields.
    #[cfg(test)]
    pub(crate) fn forged(
        index: u32,
        transaction: Transaction,
        previous_hash: Hash,
        nonce: u64,
        hash: Hash,
    ) -> Block {
        Block {
            index,
            transaction,
            previous_hash,
            nonce,
            hash,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The hash stored at construction.
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// The exact bytes fed to SHA-256.
    pub fn preimage(&self) -> Vec<u8> {
        self.to_vec()
    }

    /// Hashes the stored fields again.
    ///
    /// Equals [`Block::hash`] for every block built by `new` or `mine`.
    pub fn recompute_hash(&self) -> Hash {
        Hash::digest(self)
    }
}

/// Encodes the hash preimage; the stored hash itself is not part of it.
impl Encode for Block {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.index.encode(out);
        self.transaction.encode(out);
        self.previous_hash.encode(out);
        self.nonce.encode(out);
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block {} (Transaction: {}, Nonce: {}, prevHash: {}, hash: {})",
            self.index, self.transaction, self.nonce, self.previous_hash, self.hash
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::LeadingZeroBytes;
    use crate::utils::test_utils::utils::{first_byte_zero, seeded_rng};

    fn sample() -> Block {
        Block::new(
            1,
            Transaction::new("alice", "bob", 5),
            Hash::from([0xAB; 4]),
            42,
        )
    }

    #[test]
    fn preimage_layout() {
        let mut expected: Vec<u8> = vec![0, 0, 0, 1];
        expected.extend_from_slice(b"alice");
        expected.extend_from_slice(b"bob");
        expected.extend_from_slice(&[0, 0, 0, 5]);
        expected.extend_from_slice(&[0xAB; 4]);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 42]);
        assert_eq!(sample().preimage(), expected);
    }

    #[test]
    fn golden_hash() {
        assert_eq!(
            sample().hash().to_hex_string(),
            "CB2D74F0573C38C3214FA71DE5FB6498DAA70CCC7861FFF392A144DE9619EF82"
        );
        let genesis_shape = Block::new(0, Transaction::empty(), Hash::empty(), 0);
        assert_eq!(
            genesis_shape.hash().to_hex_string(),
            "374708FFF7719DD5979EC875D56CD2286F6D3CF7EC317A3B25632AAB28EC37BB"
        );
    }

    #[test]
    fn reconstruction_is_deterministic() {
        assert_eq!(sample(), sample());
        assert_eq!(sample().hash(), &sample().recompute_hash());
    }

    #[test]
    fn every_field_changes_hash() {
        let base = sample();
        let tx = Transaction::new("alice", "bob", 5);
        let prev = Hash::from([0xAB; 4]);
        let variants = [
            Block::new(2, tx.clone(), prev.clone(), 42),
            Block::new(1, Transaction::new("alicf", "bob", 5), prev.clone(), 42),
            Block::new(1, Transaction::new("alice", "bob!", 5), prev.clone(), 42),
            Block::new(1, Transaction::new("alice", "bob", 6), prev.clone(), 42),
            Block::new(1, tx.clone(), Hash::from([0xAB; 5]), 42),
            Block::new(1, tx, prev, 43),
        ];
        for variant in variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }

    #[test]
    fn mined_block_reconstructs() {
        let validator = first_byte_zero();
        let block = Block::mine_with_rng(
            3,
            Transaction::new("a", "b", 1),
            Hash::from([1; 32]),
            &validator,
            &MiningOptions::new(),
            &mut seeded_rng(11),
        )
        .unwrap();

        assert!(validator.accepts(block.hash()));
        let rebuilt = Block::new(
            3,
            Transaction::new("a", "b", 1),
            Hash::from([1; 32]),
            block.nonce(),
        );
        assert_eq!(rebuilt, block);
    }

    #[test]
    fn mine_with_os_entropy() {
        let validator = LeadingZeroBytes::new(1);
        let block = Block::mine(
            0,
            Transaction::empty(),
            Hash::empty(),
            &validator,
            &MiningOptions::new(),
        )
        .unwrap();
        assert_eq!(block.hash().byte_at(0), Ok(0));
        assert_eq!(block.recompute_hash(), *block.hash());
    }

    #[test]
    fn mining_respects_attempt_cap() {
        let never = |_: &Hash| false;
        let result = Block::mine_with_rng(
            0,
            Transaction::empty(),
            Hash::empty(),
            &never,
            &MiningOptions::new().with_max_attempts(5),
            &mut seeded_rng(0),
        );
        assert!(matches!(result, Err(MiningError::Exhausted { attempts: 5 })));
    }

    #[test]
    fn forged_block_fails_recompute() {
        let block = Block::forged(0, Transaction::empty(), Hash::empty(), 0, Hash::from([0; 32]));
        assert_ne!(block.recompute_hash(), *block.hash());
    }

    #[test]
    fn display_format() {
        let block = Block::new(0, Transaction::new("", "alice", 10), Hash::empty(), 7);
        assert_eq!(
            block.to_string(),
            format!(
                "Block 0 (Transaction: [Source , Target alice, Amount 10], Nonce: 7, prevHash: , hash: {})",
                block.hash()
            )
        );
    }
}
