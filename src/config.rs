//! Process configuration from command-line flags and environment variables.
//!
//! Precedence, highest first: flags, environment, defaults.

use crate::core::miner::MiningOptions;
use crate::core::validator::{DEFAULT_DIFFICULTY, LeadingZeroBytes};
use crate::utils::log::{self, LogFilter};
use hashchain_derive::Error;

pub const ENV_DIFFICULTY: &str = "HASHCHAIN_DIFFICULTY";
pub const ENV_MAX_ATTEMPTS: &str = "HASHCHAIN_MAX_ATTEMPTS";
pub const ENV_LOG: &str = "HASHCHAIN_LOG";
pub const ENV_LOG_TIMESTAMPS: &str = "HASHCHAIN_LOG_TIMESTAMPS";

/// Longest zero prefix a SHA-256 hash can have.
pub const MAX_DIFFICULTY: usize = 32;

pub const USAGE: &str = "\
Usage: hashchain [OPTIONS]

Runs an interactive proof-of-work ledger console on stdin/stdout.

Options:
  --difficulty <N>     Leading zero bytes required in block hashes (default 3, max 32)
  --max-attempts <N>   Give up mining after N nonces (default: unbounded)
  --log-level <L>      debug, info, warn, error or off (default info)
  --no-timestamps      Omit timestamps from log lines
  -h, --help           Print this message

Environment:
  HASHCHAIN_DIFFICULTY, HASHCHAIN_MAX_ATTEMPTS, HASHCHAIN_LOG,
  HASHCHAIN_LOG_TIMESTAMPS (true/false) supply defaults for the flags above.";

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{flag} requires a value")]
    MissingValue { flag: String },

    #[error("invalid value '{value}' for {name}: expected {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("unexpected argument: {0}")]
    UnknownArgument(String),
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Config),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Leading zero bytes every block hash needs.
    pub difficulty: usize,
    /// Mining attempt cap, `None` for unbounded.
    pub max_attempts: Option<u64>,
    pub log_filter: LogFilter,
    pub show_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: None,
            log_filter: LogFilter::default(),
            show_timestamp: true,
        }
    }
}

impl Config {
    /// Reads the environment layer on top of the defaults.
    ///
    /// `lookup` returns a variable's value, or `None` if it is unset.
    pub fn from_env<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(value) = lookup(ENV_DIFFICULTY) {
            config.difficulty = parse_difficulty(ENV_DIFFICULTY, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_ATTEMPTS) {
            config.max_attempts = Some(parse_attempts(ENV_MAX_ATTEMPTS, &value)?);
        }
        if let Some(value) = lookup(ENV_LOG) {
            config.log_filter = parse_log_filter(ENV_LOG, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG_TIMESTAMPS) {
            config.show_timestamp = parse_bool(ENV_LOG_TIMESTAMPS, &value)?;
        }
        Ok(config)
    }

    /// Parses flags (program name excluded) over the environment layer.
    pub fn parse<I, F>(args: I, lookup: F) -> Result<Invocation, ConfigError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::from_env(lookup)?;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Invocation::Help),
                "--difficulty" => {
                    let value = flag_value(&arg, args.next())?;
                    config.difficulty = parse_difficulty(&arg, &value)?;
                }
                "--max-attempts" => {
                    let value = flag_value(&arg, args.next())?;
                    config.max_attempts = Some(parse_attempts(&arg, &value)?);
                }
                "--log-level" => {
                    let value = flag_value(&arg, args.next())?;
                    config.log_filter = parse_log_filter(&arg, &value)?;
                }
                "--no-timestamps" => config.show_timestamp = false,
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }

        Ok(Invocation::Run(config))
    }

    /// The difficulty policy this configuration describes.
    pub fn validator(&self) -> LeadingZeroBytes {
        LeadingZeroBytes::new(self.difficulty)
    }

    pub fn mining_options(&self) -> MiningOptions {
        match self.max_attempts {
            Some(max) => MiningOptions::new().with_max_attempts(max),
            None => MiningOptions::new(),
        }
    }

    /// Installs the log filter and timestamp setting process-wide.
    pub fn apply_logging(&self) {
        log::set_max_level(self.log_filter);
        log::set_show_timestamp(self.show_timestamp);
    }
}

fn flag_value(flag: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingValue {
        flag: flag.to_string(),
    })
}

fn invalid(name: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_difficulty(name: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n <= MAX_DIFFICULTY => Ok(n),
        _ => Err(invalid(name, value, "an integer from 0 to 32")),
    }
}

fn parse_attempts(name: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(name, value, "a positive integer")),
    }
}

fn parse_log_filter(name: &str, value: &str) -> Result<LogFilter, ConfigError> {
    LogFilter::parse(value.trim())
        .ok_or_else(|| invalid(name, value, "one of debug, info, warn, error, off"))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value, "true or false")),
    }
}
