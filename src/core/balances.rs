//! Per-user balances replayed from the chain.

use crate::core::transaction::Transaction;
use hashchain_derive::Error;
use std::collections::HashMap;
use std::collections::hash_map;

/// A debit larger than the payer's balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{user} has {available} but tried to pay {requested}")]
pub struct InsufficientFunds {
    pub user: String,
    pub available: i64,
    pub requested: i64,
}

/// Mapping from user name to balance. Users never seen hold zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    accounts: HashMap<String, i64>,
}

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of `user`, zero if unknown.
    pub fn get(&self, user: &str) -> i64 {
        self.accounts.get(user).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, user: &str, amount: i64) {
        let balance = self.entry(user);
        *balance = balance.saturating_add(amount);
    }

    /// Takes `amount` from `user`, refusing to go below zero.
    pub fn debit(&mut self, user: &str, amount: i64) -> Result<(), InsufficientFunds> {
        let available = self.get(user);
        if available < amount {
            return Err(InsufficientFunds {
                user: user.to_string(),
                available,
                requested: amount,
            });
        }
        let balance = self.entry(user);
        *balance = balance.saturating_sub(amount);
        Ok(())
    }

    /// Applies `transaction` without any solvency check.
    ///
    /// Deposits only credit the target.
    pub fn record(&mut self, transaction: &Transaction) {
        let amount = i64::from(transaction.amount());
        if !transaction.is_deposit() {
            let balance = self.entry(transaction.source());
            *balance = balance.saturating_sub(amount);
        }
        self.credit(transaction.target(), amount);
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, i64> {
        self.accounts.iter()
    }

    /// Number of users with an entry.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn entry(&mut self, user: &str) -> &mut i64 {
        self.accounts.entry(user.to_string()).or_insert(0)
    }
}

impl<'a> IntoIterator for &'a Balances {
    type Item = (&'a String, &'a i64);
    type IntoIter = hash_map::Iter<'a, String, i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_user_has_zero() {
        let balances = Balances::new();
        assert_eq!(balances.get("nobody"), 0);
        assert!(balances.is_empty());
    }

    #[test]
    fn credit_then_debit() {
        let mut balances = Balances::new();
        balances.credit("alice", 100);
        balances.debit("alice", 30).unwrap();
        assert_eq!(balances.get("alice"), 70);
        assert_eq!(balances.len(), 1);
    }

    #[test]
    fn debit_can_empty_an_account() {
        let mut balances = Balances::new();
        balances.credit("alice", 10);
        assert!(balances.debit("alice", 10).is_ok());
        assert_eq!(balances.get("alice"), 0);
    }

    #[test]
    fn overdraft_is_refused_and_leaves_balance() {
        let mut balances = Balances::new();
        balances.credit("alice", 5);
        let err = balances.debit("alice", 6).unwrap_err();
        assert_eq!(
            err,
            InsufficientFunds {
                user: "alice".into(),
                available: 5,
                requested: 6,
            }
        );
        assert_eq!(err.to_string(), "alice has 5 but tried to pay 6");
        assert_eq!(balances.get("alice"), 5);
    }

    #[test]
    fn record_moves_value_from_source_to_target() {
        let mut balances = Balances::new();
        balances.record(&Transaction::deposit("a", 100));
        balances.record(&Transaction::new("a", "b", 30));
        assert_eq!(balances.get("a"), 70);
        assert_eq!(balances.get("b"), 30);
        assert_eq!(balances.get(""), 0);
    }

    #[test]
    fn record_does_not_check_solvency() {
        let mut balances = Balances::new();
        balances.record(&Transaction::new("a", "b", 30));
        assert_eq!(balances.get("a"), -30);
        assert_eq!(balances.get("b"), 30);
    }

    #[test]
    fn arithmetic_saturates() {
        let mut balances = Balances::new();
        balances.credit("whale", i64::MAX);
        balances.credit("whale", 1);
        assert_eq!(balances.get("whale"), i64::MAX);
    }

    #[test]
    fn iterates_all_entries() {
        let mut balances = Balances::new();
        balances.credit("a", 1);
        balances.credit("b", 2);
        let mut entries: Vec<_> = (&balances).into_iter().map(|(u, b)| (u.clone(), *b)).collect();
        entries.sort();
        assert_eq!(entries, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }
}
