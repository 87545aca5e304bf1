//! Command line arguments

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// Acquire or release a named lock held in DynamoDB
#[derive(Debug, Parser)]
#[command(name = "condlock", version, about)]
pub struct Cli {
    /// Settings file (yaml, toml or json)
    #[arg(short = 'c', long = "config", env = "CONDLOCK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Lock table name
    #[arg(long = "table", global = true)]
    pub table: Option<String>,

    /// AWS region
    #[arg(long = "region", global = true)]
    pub region: Option<String>,

    /// DynamoDB endpoint override
    #[arg(long = "endpoint", global = true)]
    pub endpoint: Option<String>,

    /// Use plain HTTP for the endpoint
    #[arg(long = "disable-ssl", global = true)]
    pub disable_ssl: bool,

    /// Lock TTL, e.g. "1m"
    #[arg(long = "ttl", value_parser = humantime::parse_duration, global = true)]
    pub ttl: Option<Duration>,

    /// Wait between acquire attempts, e.g. "1s"
    #[arg(long = "reattempt", value_parser = humantime::parse_duration, global = true)]
    pub reattempt: Option<Duration>,

    /// Give up acquiring after this long; "0s" retries forever
    #[arg(long = "cutoff", value_parser = humantime::parse_duration, global = true)]
    pub cutoff: Option<Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Block until the lock for KEY is acquired
    Lock { key: String },
    /// Delete the lock for KEY
    Unlock { key: String },
}

impl Command {
    pub fn key(&self) -> &str {
        match self {
            Command::Lock { key } | Command::Unlock { key } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lock_with_durations() {
        let cli = Cli::try_parse_from([
            "condlock",
            "--table",
            "locks",
            "--ttl",
            "30s",
            "--reattempt",
            "300ms",
            "lock",
            "deploy",
        ])
        .unwrap();

        assert_eq!(cli.table.as_deref(), Some("locks"));
        assert_eq!(cli.ttl, Some(Duration::from_secs(30)));
        assert_eq!(cli.reattempt, Some(Duration::from_millis(300)));
        assert_eq!(cli.cutoff, None);
        assert_eq!(
            cli.command,
            Command::Lock {
                key: "deploy".to_string()
            }
        );
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["condlock", "unlock", "deploy", "--disable-ssl", "--cutoff", "0s"])
                .unwrap();

        assert!(cli.disable_ssl);
        assert_eq!(cli.cutoff, Some(Duration::ZERO));
        assert_eq!(cli.command.key(), "deploy");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(Cli::try_parse_from(["condlock", "lock"]).is_err());
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        assert!(Cli::try_parse_from(["condlock", "renew", "deploy"]).is_err());
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(Cli::try_parse_from(["condlock", "--ttl", "soon", "lock", "deploy"]).is_err());
    }
}
