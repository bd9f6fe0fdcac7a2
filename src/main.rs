//! Interactive proof-of-work ledger.
//!
//! Mines a genesis block, then reads console commands from stdin.
//!
//! # Usage
//! ```text
//! hashchain [--difficulty N] [--max-attempts N] [--log-level L] [--no-timestamps]
//! ```
//!
//! Every flag can also be supplied through a `HASHCHAIN_*` environment
//! variable; flags win. See `config::USAGE`.

use hashchain::config::{Config, Invocation, USAGE};
use hashchain::{console, error};
use std::env;
use std::io;
use std::process;

fn main() {
    let config = match Config::parse(env::args().skip(1), |name| env::var(name).ok()) {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Help) => {
            println!("{}", USAGE);
            return;
        }
        Err(e) => {
            eprintln!("{}\n", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };
    config.apply_logging();

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = console::start(&config, stdin.lock(), stdout.lock()) {
        error!("{}", e);
        process::exit(1);
    }
}
