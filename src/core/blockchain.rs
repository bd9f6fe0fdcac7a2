//! The ledger: an append-only, hash-linked sequence of mined blocks.

use crate::core::balances::{Balances, InsufficientFunds};
use crate::core::block::Block;
use crate::core::miner::{MiningError, MiningOptions};
use crate::core::transaction::Transaction;
use crate::core::validator::HashValidator;
use crate::types::hash::Hash;
use crate::{info, warn};
use hashchain_derive::Error;
use std::collections::HashSet;
use std::slice;

/// Reasons `append` refuses a block. The ledger is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppendError {
    #[error("block hash {hash} is not accepted by the validator")]
    UnacceptableHash { hash: Hash },

    #[error("block hash {stored} does not match its contents, expected {computed}")]
    HashMismatch { stored: Hash, computed: Hash },

    #[error("previous hash {actual} does not match the chain tip {expected}")]
    PreviousHashMismatch { expected: Hash, actual: Hash },

    #[error("block index {actual} does not follow the chain, expected {expected}")]
    IndexMismatch { expected: u32, actual: u32 },
}

/// The rule a block broke during verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("negative amount {amount}")]
    NegativeAmount { amount: i32 },

    #[error("insufficient funds: {0}")]
    InsufficientFunds(#[from] InsufficientFunds),

    #[error("stored hash {stored} differs from recomputed hash {computed}")]
    HashMismatch { stored: Hash, computed: Hash },

    #[error("hash {hash} is not accepted by the validator")]
    UnacceptableHash { hash: Hash },

    #[error("previous hash {actual} does not link to {expected}")]
    BrokenLink { expected: Hash, actual: Hash },

    #[error("index {actual} stored at position {expected}")]
    IndexMismatch { expected: usize, actual: u32 },
}

/// First failure found while verifying the whole chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {index} is invalid: {violation}")]
pub struct VerificationError {
    /// Chain position of the offending block.
    pub index: usize,
    #[source]
    pub violation: Violation,
}

/// Ordered chain of blocks starting at a mined genesis block.
///
/// Generic over the difficulty policy for static dispatch. Mutation takes
/// `&mut self`, and the iterators borrow the ledger, so a traversal can never
/// observe a block being appended or removed.
pub struct Ledger<V: HashValidator> {
    blocks: Vec<Block>,
    validator: V,
    options: MiningOptions,
}

impl<V: HashValidator> Ledger<V> {
    /// Creates a ledger holding a freshly mined genesis block.
    pub fn new(validator: V) -> Result<Self, MiningError> {
        Self::with_options(validator, MiningOptions::default())
    }

    /// Like [`Ledger::new`], with bounds applied to every mining call.
    pub fn with_options(validator: V, options: MiningOptions) -> Result<Self, MiningError> {
        let genesis = Block::mine(0, Transaction::empty(), Hash::empty(), &validator, &options)?;
        info!(
            "Initialized ledger with genesis block: nonce={} hash={}",
            genesis.nonce(),
            genesis.hash()
        );

        Ok(Self {
            blocks: vec![genesis],
            validator,
            options,
        })
    }

    /// Finds a nonce for `transaction` at the next position. Does not modify the chain.
    pub fn mine(&self, transaction: &Transaction) -> Result<u64, MiningError> {
        self.mine_block(transaction.clone()).map(|block| block.nonce())
    }

    /// Mines the complete block that would follow the current tip.
    pub fn mine_block(&self, transaction: Transaction) -> Result<Block, MiningError> {
        Block::mine(
            self.next_index(),
            transaction,
            self.tip_hash().clone(),
            &self.validator,
            &self.options,
        )
    }

    /// Rebuilds the block that would follow the current tip with the given nonce.
    pub fn next_block(&self, transaction: Transaction, nonce: u64) -> Block {
        Block::new(self.next_index(), transaction, self.tip_hash().clone(), nonce)
    }

    /// Links `block` as the new tip.
    ///
    /// Checks, in order: validator acceptance, hash integrity, link to the
    /// current tip, then index. Balances are not checked here; an overdraft
    /// is only reported by [`Ledger::check`].
    pub fn append(&mut self, block: Block) -> Result<(), AppendError> {
        if let Err(err) = self.validate_next(&block) {
            warn!("Rejected block {}: {}", block.index(), err);
            return Err(err);
        }

        info!(
            "Appended block {}: {} hash={}",
            block.index(),
            block.transaction(),
            block.hash()
        );
        self.blocks.push(block);
        Ok(())
    }

    fn validate_next(&self, block: &Block) -> Result<(), AppendError> {
        if !self.validator.accepts(block.hash()) {
            return Err(AppendError::UnacceptableHash {
                hash: block.hash().clone(),
            });
        }

        let computed = block.recompute_hash();
        if computed != *block.hash() {
            return Err(AppendError::HashMismatch {
                stored: block.hash().clone(),
                computed,
            });
        }

        if block.previous_hash() != self.tip_hash() {
            return Err(AppendError::PreviousHashMismatch {
                expected: self.tip_hash().clone(),
                actual: block.previous_hash().clone(),
            });
        }

        let expected = self.next_index();
        if block.index() != expected {
            return Err(AppendError::IndexMismatch {
                expected,
                actual: block.index(),
            });
        }

        Ok(())
    }

    /// Drops the tip. Returns false, leaving the chain untouched, if only genesis remains.
    pub fn remove_last(&mut self) -> bool {
        if self.blocks.len() <= 1 {
            return false;
        }
        if let Some(removed) = self.blocks.pop() {
            info!("Removed block {} hash={}", removed.index(), removed.hash());
        }
        true
    }

    /// Hash of the tip block.
    pub fn tip_hash(&self) -> &Hash {
        self.tip().hash()
    }

    /// Number of blocks, genesis included. Never zero.
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn tip(&self) -> &Block {
        // The vector is created with genesis and never shrinks below it.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    fn next_index(&self) -> u32 {
        u32::try_from(self.blocks.len()).unwrap_or(u32::MAX)
    }

    /// Verifies the whole chain in order.
    ///
    /// For every block: the amount is non-negative, a non-deposit source can
    /// pay from its running balance, the stored hash matches the contents and
    /// is accepted by the validator, the previous hash links to the prior
    /// block, and the index matches the position. Stops at the first failure.
    pub fn check(&self) -> Result<(), VerificationError> {
        let result = self.verify();
        if let Err(err) = &result {
            warn!("Chain verification failed: {}", err);
        }
        result
    }

    fn verify(&self) -> Result<(), VerificationError> {
        let mut balances = Balances::new();
        let mut previous: Option<&Block> = None;

        for (index, block) in self.blocks.iter().enumerate() {
            let fail = |violation: Violation| VerificationError { index, violation };
            let tx = block.transaction();

            if tx.amount() < 0 {
                return Err(fail(Violation::NegativeAmount {
                    amount: tx.amount(),
                }));
            }

            let amount = i64::from(tx.amount());
            if !tx.is_deposit() {
                balances
                    .debit(tx.source(), amount)
                    .map_err(|err| fail(err.into()))?;
            }
            balances.credit(tx.target(), amount);

            let computed = block.recompute_hash();
            if computed != *block.hash() {
                return Err(fail(Violation::HashMismatch {
                    stored: block.hash().clone(),
                    computed,
                }));
            }

            if !self.validator.accepts(block.hash()) {
                return Err(fail(Violation::UnacceptableHash {
                    hash: block.hash().clone(),
                }));
            }

            if let Some(prev) = previous {
                if prev.hash() != block.previous_hash() {
                    return Err(fail(Violation::BrokenLink {
                        expected: prev.hash().clone(),
                        actual: block.previous_hash().clone(),
                    }));
                }
            }

            if block.index() as usize != index {
                return Err(fail(Violation::IndexMismatch {
                    expected: index,
                    actual: block.index(),
                }));
            }

            previous = Some(block);
        }

        Ok(())
    }

    /// Returns true if [`Ledger::check`] passes.
    pub fn is_correct(&self) -> bool {
        self.check().is_ok()
    }

    /// Balance of `user` after replaying every transaction. Zero for unknown users.
    pub fn balance(&self, user: &str) -> i64 {
        self.balances().get(user)
    }

    /// Every user's balance after replaying the chain.
    pub fn balances(&self) -> Balances {
        let mut balances = Balances::new();
        for tx in self.transactions() {
            balances.record(tx);
        }
        balances
    }

    /// Distinct non-empty user names, in order of first appearance.
    pub fn users(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut users = Vec::new();
        for tx in self.transactions() {
            for name in [tx.source(), tx.target()] {
                if !name.is_empty() && seen.insert(name) {
                    users.push(name);
                }
            }
        }
        users
    }

    /// Blocks from genesis to tip.
    pub fn blocks(&self) -> slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Transactions from genesis to tip.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.blocks.iter().map(Block::transaction)
    }
}

impl<'a, V: HashValidator> IntoIterator for &'a Ledger<V> {
    type Item = &'a Block;
    type IntoIter = slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks()
    }
}
