//! Command-line interface for stratacache
//!
//! Parses arguments with clap and runs a single cache operation against the
//! configured stack. Values are read and printed as JSON.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::cache::{Cache, Namespace};
use crate::config::StackConfig;
use crate::error::CacheError;

/// Error types for the command-line tool
#[derive(Debug, Error)]
pub enum CliError {
    /// The cache stack could not be set up
    #[error("Cache setup failed: {0}")]
    Setup(#[from] CacheError),

    /// Output could not be rendered
    #[error("Could not render output: {0}")]
    Render(#[from] serde_json::Error),
}

/// Stratacache - namespaced, tiered key/value cache
#[derive(Parser, Debug)]
#[command(name = "stratacache")]
#[command(about = "Inspect and modify a tiered key/value cache")]
#[command(version)]
pub struct Cli {
    /// JSON file describing the cache stack
    ///
    /// Without it a single tier in the per-user cache directory is used.
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Id and namespace shared by the keyed commands
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Entry id
    pub id: String,

    /// Namespace segment; repeat for nested namespaces
    #[arg(long = "namespace", short = 'n', value_name = "SEGMENT")]
    pub namespace: Vec<String>,
}

impl KeyArgs {
    /// The namespace built from the given segments
    pub fn namespace(&self) -> Namespace {
        Namespace::new(self.namespace.iter().cloned())
    }
}

/// Cache operations
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print a cached value
    Get(KeyArgs),

    /// Store a value (JSON, or plain text stored as a string)
    Set {
        #[command(flatten)]
        key: KeyArgs,

        /// The value to store
        value: String,

        /// Lifetime in seconds; 0 keeps the entry forever
        #[arg(long, value_name = "SECS")]
        ttl: Option<u64>,
    },

    /// Remove a cached value
    Delete(KeyArgs),

    /// Print the remaining lifetime in seconds (0 means never expires)
    Ttl(KeyArgs),

    /// Exit successfully if the entry exists
    Contains(KeyArgs),

    /// Remove every entry in a namespace, or everything
    Flush {
        /// Namespace segment; repeat for nested namespaces
        #[arg(long = "namespace", short = 'n', value_name = "SEGMENT")]
        namespace: Vec<String>,
    },

    /// Print statistics for each tier
    Stats,
}

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Text for stdout, if any
    pub output: Option<String>,
    /// Whether the process should exit successfully
    pub success: bool,
}

impl Outcome {
    fn printed(output: String) -> Self {
        Self {
            output: Some(output),
            success: true,
        }
    }

    fn status(success: bool) -> Self {
        Self {
            output: None,
            success,
        }
    }
}

/// Parses a value argument as JSON, falling back to a plain string
///
/// # Examples
/// * `42` becomes the number 42
/// * `{"a":1}` becomes an object
/// * `hello` becomes the string "hello"
pub fn parse_value_arg(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

impl Cli {
    /// Loads the stack configuration named on the command line
    pub fn stack_config(&self) -> Result<StackConfig, CliError> {
        match &self.config {
            Some(path) => Ok(StackConfig::load(path)?),
            None => Ok(StackConfig::default()),
        }
    }
}

/// Runs `command` against `cache`
pub fn execute(cache: &dyn Cache, command: &Command) -> Result<Outcome, CliError> {
    let outcome = match command {
        Command::Get(key) => match cache.fetch(&key.id, &key.namespace()) {
            Some(value) => Outcome::printed(serde_json::to_string_pretty(&value)?),
            None => Outcome::status(false),
        },
        Command::Set { key, value, ttl } => {
            Outcome::status(cache.save(&key.id, parse_value_arg(value), *ttl, &key.namespace()))
        }
        Command::Delete(key) => Outcome::status(cache.delete(&key.id, &key.namespace())),
        Command::Ttl(key) => match cache.time_to_live(&key.id, &key.namespace()) {
            Some(ttl) => Outcome::printed(ttl.as_secs().to_string()),
            None => Outcome::status(false),
        },
        Command::Contains(key) => Outcome::status(cache.contains(&key.id, &key.namespace())),
        Command::Flush { namespace } => {
            Outcome::status(cache.flush(&Namespace::new(namespace.iter().cloned())))
        }
        Command::Stats => Outcome::printed(serde_json::to_string_pretty(&cache.stats())?),
    };
    Ok(outcome)
}
