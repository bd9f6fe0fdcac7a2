use hashchain::core::block::Block;
use hashchain::core::blockchain::{AppendError, Ledger, Violation};
use hashchain::core::miner::{MiningError, MiningOptions};
use hashchain::core::transaction::Transaction;
use hashchain::core::validator::HashValidator;
use hashchain::types::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn first_byte_zero(hash: &Hash) -> bool {
    hash.byte_at(0) == Ok(0)
}

fn mine_and_append<V: HashValidator>(ledger: &mut Ledger<V>, tx: Transaction) -> Block {
    let nonce = ledger.mine(&tx).unwrap();
    let block = ledger.next_block(tx, nonce);
    ledger.append(block.clone()).unwrap();
    block
}

#[test]
fn three_transfers_end_to_end() {
    let mut ledger = Ledger::new(first_byte_zero).unwrap();
    assert_eq!(ledger.size(), 1);

    mine_and_append(&mut ledger, Transaction::deposit("alice", 100));
    mine_and_append(&mut ledger, Transaction::new("alice", "bob", 30));
    mine_and_append(&mut ledger, Transaction::new("bob", "carol", 10));

    assert_eq!(ledger.size(), 4);
    assert!(ledger.check().is_ok());
    assert_eq!(ledger.users(), vec!["alice", "bob", "carol"]);
    assert_eq!(ledger.balance("alice"), 70);
    assert_eq!(ledger.balance("bob"), 20);
    assert_eq!(ledger.balance("carol"), 10);
    assert_eq!(ledger.balance("dave"), 0);

    for (position, block) in ledger.blocks().enumerate() {
        assert_eq!(block.index() as usize, position);
        assert!(first_byte_zero(block.hash()));
        assert_eq!(block.recompute_hash(), *block.hash());
    }
}

#[test]
fn remove_and_reappend() {
    let mut ledger = Ledger::new(first_byte_zero).unwrap();
    let genesis = ledger.tip_hash().clone();
    let first = mine_and_append(&mut ledger, Transaction::deposit("alice", 5));

    assert!(ledger.remove_last());
    assert_eq!(ledger.tip_hash(), &genesis);
    assert!(!ledger.remove_last());
    assert_eq!(ledger.size(), 1);

    // The removed block still links to the unchanged tip.
    ledger.append(first).unwrap();
    assert_eq!(ledger.size(), 2);
    assert!(ledger.is_correct());
}

#[test]
fn nonce_mined_for_one_amount_does_not_carry_over() {
    let mut ledger = Ledger::new(first_byte_zero).unwrap();
    let tx = Transaction::deposit("alice", 100);
    let nonce = ledger.mine(&tx).unwrap();

    // Some other amount under the same nonce hashes outside the difficulty target.
    let altered = (101..)
        .map(|amount| ledger.next_block(Transaction::deposit("alice", amount), nonce))
        .find(|block| !first_byte_zero(block.hash()))
        .unwrap();
    let hash = altered.hash().clone();

    assert_eq!(
        ledger.append(altered),
        Err(AppendError::UnacceptableHash { hash })
    );
    assert_eq!(ledger.size(), 1);

    let original = ledger.next_block(tx, nonce);
    ledger.append(original).unwrap();
    assert!(ledger.is_correct());
}

#[test]
fn overdraft_detected_by_check() {
    let mut ledger = Ledger::new(first_byte_zero).unwrap();
    mine_and_append(&mut ledger, Transaction::deposit("A", 100));
    mine_and_append(&mut ledger, Transaction::new("A", "B", 30));
    mine_and_append(&mut ledger, Transaction::new("A", "C", 1000));

    let err = ledger.check().unwrap_err();
    assert_eq!(err.index, 3);
    assert!(matches!(err.violation, Violation::InsufficientFunds(_)));
    assert!(!ledger.is_correct());
}

#[test]
fn cancelled_ledger_creation() {
    let flag = Arc::new(AtomicBool::new(true));
    let options = MiningOptions::new().with_cancel_flag(flag);
    let never = |_: &Hash| false;

    let result = Ledger::with_options(never, options);
    assert!(matches!(result, Err(MiningError::Cancelled { attempts: 0 })));
}
