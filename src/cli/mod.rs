//! Lookaside command line interface.

pub mod commands;
pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lookaside - cache-aside lookup service with a bounded LRU cache.
#[derive(Parser, Debug)]
#[command(name = "lookaside")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "lookaside.toml")]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes configuration in the current directory.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Serves lookups over stdin/stdout (newline-delimited JSON).
    Serve,

    /// Looks up keys through the cache, in order.
    Lookup {
        /// Keys to look up.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Runs a concurrent workload against a synthetic resolver.
    Simulate {
        /// Number of concurrent callers.
        #[arg(long, default_value_t = 8)]
        tasks: usize,

        /// Lookups per caller.
        #[arg(long, default_value_t = 500)]
        requests: usize,

        /// Size of the key space.
        #[arg(long, default_value_t = 100)]
        keys: usize,

        /// Resolver latency in milliseconds.
        #[arg(long, default_value_t = 1)]
        latency_ms: u64,

        /// Overrides the configured cache capacity.
        #[arg(long)]
        capacity: Option<usize>,

        /// Enables single-flight regardless of the configuration.
        #[arg(long)]
        single_flight: bool,
    },

    /// Edits the configuration interactively.
    Config,

    /// Diagnoses configuration problems.
    Doctor,

    /// Shows version.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup() {
        let cli = Cli::parse_from(["lookaside", "lookup", "ls", "cat"]);
        match cli.command {
            Commands::Lookup { keys } => assert_eq!(keys, vec!["ls", "cat"]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from("lookaside.toml"));
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::parse_from(["lookaside", "-v", "simulate", "--capacity", "3"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Simulate {
                tasks,
                requests,
                keys,
                capacity,
                single_flight,
                ..
            } => {
                assert_eq!(tasks, 8);
                assert_eq!(requests, 500);
                assert_eq!(keys, 100);
                assert_eq!(capacity, Some(3));
                assert!(!single_flight);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_requires_keys() {
        assert!(Cli::try_parse_from(["lookaside", "lookup"]).is_err());
    }
}
