//! Value transfers carried by blocks.

use crate::types::encoding::{Encode, EncodeSink};
use std::fmt;

/// Immutable transfer of `amount` from `source` to `target`.
///
/// An empty `source` marks an external deposit: nobody is debited.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Transaction {
    source: String,
    target: String,
    amount: i32,
}

impl Transaction {
    pub fn new(source: impl Into<String>, target: impl Into<String>, amount: i32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            amount,
        }
    }

    /// Creates a deposit crediting `target` from outside the ledger.
    pub fn deposit(target: impl Into<String>, amount: i32) -> Self {
        Self::new(String::new(), target, amount)
    }

    /// The no-op transaction carried by the genesis block.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    /// Returns true if no account pays for this transaction.
    pub fn is_deposit(&self) -> bool {
        self.source.is_empty()
    }
}

impl Encode for Transaction {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.source.encode(out);
        self.target.encode(out);
        self.amount.encode(out);
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Source {}, Target {}, Amount {}]",
            self.source, self.target, self.amount
        )
    }
}
