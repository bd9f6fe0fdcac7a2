//! Interactive ledger console.
//!
//! Reads commands line by line and prints results to the session's writer.
//! Diagnostics go to the logger instead, so piping the output stays clean.

pub mod command;
pub mod prompt;

use crate::config::Config;
use crate::core::blockchain::Ledger;
use crate::core::miner::MiningError;
use crate::core::transaction::Transaction;
use crate::core::validator::HashValidator;
use crate::info;
use command::{Command, INSTRUCTIONS};
use hashchain_derive::Error;
use prompt::Prompter;
use std::io::{self, BufRead, Write};
use std::num::ParseIntError;
use std::str::FromStr;

/// Errors that end a console session.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("could not mine the genesis block: {0}")]
    Genesis(#[from] MiningError),

    #[error("console i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Builds a ledger from `config` and runs a session until `quit` or end of input.
pub fn start<R, W>(config: &Config, input: R, output: W) -> Result<(), ConsoleError>
where
    R: BufRead,
    W: Write,
{
    info!(
        "Mining genesis block at difficulty {} (max attempts: {})",
        config.difficulty,
        config
            .max_attempts
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    );
    let ledger = Ledger::with_options(config.validator(), config.mining_options())?;
    Session::new(ledger, input, output).run()?;
    Ok(())
}

/// A nonce typed at the console.
///
/// Negative input is read as a signed 64-bit value and reinterpreted, so a
/// nonce printed as a signed integer hashes to the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Nonce(u64);

impl FromStr for Nonce {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u64>() {
            Ok(n) => Ok(Nonce(n)),
            Err(_) => s.parse::<i64>().map(|n| Nonce(n as u64)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// One console session over a ledger.
pub struct Session<R, W, V: HashValidator> {
    ledger: Ledger<V>,
    io: Prompter<R, W>,
}

impl<R: BufRead, W: Write, V: HashValidator> Session<R, W, V> {
    pub fn new(ledger: Ledger<V>, input: R, output: W) -> Self {
        Self {
            ledger,
            io: Prompter::new(input, output),
        }
    }

    pub fn ledger(&self) -> &Ledger<V> {
        &self.ledger
    }

    /// Runs commands until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        self.io.say(INSTRUCTIONS)?;

        loop {
            let Some(line) = self.io.line("\nCommand: ")? else {
                break;
            };
            let flow = match line.parse::<Command>() {
                Ok(command) => self.execute(command)?,
                Err(_) => {
                    self.io.say("invalid command entered, please try again")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }
        }

        self.io.print("\nGoodbye\n")
    }

    fn execute(&mut self, command: Command) -> io::Result<Flow> {
        match command {
            Command::Mine => self.mine(),
            Command::Append => self.append(),
            Command::Remove => {
                if self.ledger.remove_last() {
                    self.io.say("Last value in blockchain removed")?;
                } else {
                    self.io.say("Cannot remove the genesis block")?;
                }
                Ok(Flow::Continue)
            }
            Command::Check => {
                match self.ledger.check() {
                    Ok(()) => self.io.say("The blockchain checks out.")?,
                    Err(err) => self.io.say(err)?,
                }
                Ok(Flow::Continue)
            }
            Command::Users => {
                for user in self.ledger.users() {
                    self.io.say(user)?;
                }
                Ok(Flow::Continue)
            }
            Command::Balance => {
                let Some(user) = self.io.line("User: ")? else {
                    return Ok(Flow::Quit);
                };
                let balance = self.ledger.balance(&user);
                self.io.say(format!("{}'s balance is {}", user, balance))?;
                Ok(Flow::Continue)
            }
            Command::Transactions => {
                for tx in self.ledger.transactions() {
                    self.io.say(tx)?;
                }
                Ok(Flow::Continue)
            }
            Command::Blocks => {
                for block in &self.ledger {
                    self.io.say(block)?;
                }
                Ok(Flow::Continue)
            }
            Command::Help => {
                self.io.say(INSTRUCTIONS)?;
                Ok(Flow::Continue)
            }
            Command::Quit => Ok(Flow::Quit),
        }
    }

    fn mine(&mut self) -> io::Result<Flow> {
        let Some(tx) = self.read_transaction()? else {
            return Ok(Flow::Quit);
        };
        match self.ledger.mine(&tx) {
            Ok(nonce) => self.io.say(format!("Use nonce: {}", nonce))?,
            Err(err) => self.io.say(format!("Could not mine: {}", err))?,
        }
        Ok(Flow::Continue)
    }

    fn append(&mut self) -> io::Result<Flow> {
        let Some(tx) = self.read_transaction()? else {
            return Ok(Flow::Quit);
        };
        let Some(Nonce(nonce)) = self.io.number::<Nonce>("Nonce: ")? else {
            return Ok(Flow::Quit);
        };

        let block = self.ledger.next_block(tx, nonce);
        let shown = block.to_string();
        match self.ledger.append(block) {
            Ok(()) => self.io.say(format!("Appended: {}", shown))?,
            Err(err) => self.io.say(format!("Could not append: {}", err))?,
        }
        Ok(Flow::Continue)
    }

    /// Prompts for source, target and amount. `None` at end of input.
    fn read_transaction(&mut self) -> io::Result<Option<Transaction>> {
        let Some(source) = self.io.line("Source (return for deposit): ")? else {
            return Ok(None);
        };
        let Some(target) = self.io.line("Target: ")? else {
            return Ok(None);
        };
        let Some(amount) = self.io.number::<i32>("Amount: ")? else {
            return Ok(None);
        };
        Ok(Some(Transaction::new(source, target, amount)))
    }
}
