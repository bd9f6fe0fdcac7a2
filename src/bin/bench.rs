//! Mining and verification benchmark binary.
//!
//! Measures raw block hashing, nonce search per difficulty and whole-chain
//! verification.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use hashchain::core::block::Block;
use hashchain::core::blockchain::Ledger;
use hashchain::core::miner::MiningOptions;
use hashchain::core::transaction::Transaction;
use hashchain::core::validator::LeadingZeroBytes;
use hashchain::types::hash::Hash;
use hashchain::utils::log::{LogFilter, set_max_level};

struct BenchResult {
    name: String,
    iterations: u64,
    total: Duration,
    /// Units of work per iteration (hashes, blocks), used for the rate column.
    work_per_iter: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations.max(1) as u32
    }

    fn print(&self) {
        let avg = self.avg();
        let rate = self
            .work_per_iter
            .filter(|&n| n > 0)
            .map(|n| {
                let per_sec = (n * self.iterations) as f64 / self.total.as_secs_f64();
                format!("{:>12.0}", per_sec)
            })
            .unwrap_or_else(|| "           -".to_string());
        println!(
            "  {:<30} {:>7} iters {:>12.3} us/iter {} /s",
            self.name,
            self.iterations,
            avg.as_nanos() as f64 / 1000.0,
            rate,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: String, min_duration: Duration, work_per_iter: Option<u64>, mut f: F) -> BenchResult
where
    F: FnMut(),
{
    // Warmup
    for _ in 0..3 {
        f();
    }

    let mut iterations = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        f();
        iterations += 1;
    }

    BenchResult {
        name,
        iterations,
        total: start.elapsed(),
        work_per_iter,
    }
}

fn main() {
    set_max_level(LogFilter::Off);
    let min = Duration::from_secs(2);

    println!("Ledger Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>16} {:>14}",
        "benchmark", "iters", "avg time", "rate"
    );
    println!("  {}", "-".repeat(76));

    // 1. Reconstructing a block costs one full hash.
    let tx = Transaction::new("alice", "bob", 25);
    let prev = Hash::sha256().finalize();
    let mut nonce = 0u64;
    let r = bench("block_hash".to_string(), min, Some(1), || {
        nonce = nonce.wrapping_add(1);
        let block = Block::new(1, tx.clone(), prev.clone(), nonce);
        std::hint::black_box(block);
    });
    r.print();

    // 2. Nonce search; expected attempts grow 256x per zero byte.
    for difficulty in [1usize, 2] {
        let validator = LeadingZeroBytes::new(difficulty);
        let options = MiningOptions::new();
        let r = bench(format!("mine(difficulty={})", difficulty), min, Some(1), || {
            let block = Block::mine(1, tx.clone(), prev.clone(), &validator, &options)
                .expect("mining failed");
            std::hint::black_box(block);
        });
        r.print();
    }

    // 3. Verification of a 100 block chain.
    let mut ledger = Ledger::new(LeadingZeroBytes::new(1)).expect("genesis failed");
    for i in 0..100 {
        let tx = if i == 0 {
            Transaction::deposit("alice", 1_000_000)
        } else {
            Transaction::new("alice", format!("user{}", i), i)
        };
        let block = ledger.mine_block(tx).expect("mining failed");
        ledger.append(block).expect("append failed");
    }
    let r = bench("check(101 blocks)".to_string(), min, Some(101), || {
        std::hint::black_box(ledger.check()).expect("chain invalid");
    });
    r.print();

    let r = bench("balances(101 blocks)".to_string(), min, Some(101), || {
        std::hint::black_box(ledger.balances());
    });
    r.print();
}
