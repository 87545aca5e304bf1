//! Settings loading
//!
//! Sources, lowest precedence first: optional settings file, `CONDLOCK_*`
//! environment variables (`__` separates nesting, e.g.
//! `CONDLOCK_STORE__TABLE_NAME`), then command line flags.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use config::{Config, ConfigBuilder, Environment, builder::DefaultState};
use serde::Deserialize;

use condlock_core::LockConfig;
use condlock_dynamo::DynamoStoreConfig;

use crate::cli::Cli;
use crate::logging::{LogRotation, LoggingConfig};

pub const ENV_PREFIX: &str = "CONDLOCK";

/// Effective settings after all sources are merged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: DynamoStoreConfig,
    pub lock: LockSettings,
    pub logging: LogSettings,
}

/// Lock timing in humantime notation ("1m", "300ms")
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    pub ttl: String,
    pub reattempt: String,
    pub cutoff: String,
}

impl Default for LockSettings {
    fn default() -> Self {
        let defaults = LockConfig::default();
        Self {
            ttl: humantime::format_duration(defaults.ttl).to_string(),
            reattempt: humantime::format_duration(defaults.reattempt_wait).to_string(),
            cutoff: humantime::format_duration(defaults.cutoff).to_string(),
        }
    }
}

impl LockSettings {
    pub fn to_lock_config(&self) -> anyhow::Result<LockConfig> {
        Ok(LockConfig {
            ttl: parse_duration("lock.ttl", &self.ttl)?,
            reattempt_wait: parse_duration("lock.reattempt", &self.reattempt)?,
            cutoff: parse_duration("lock.cutoff", &self.cutoff)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// Also write a daily rolling `condlock.log` here
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl LogSettings {
    /// The configured level, or `None` if it is not a level name
    pub fn level(&self) -> Option<tracing::Level> {
        self.level.trim().parse().ok()
    }

    pub fn logging_config(&self) -> LoggingConfig {
        let level = self.level().unwrap_or_else(|| {
            eprintln!("condlock: unknown log level '{}', using info", self.level);
            tracing::Level::INFO
        });
        LoggingConfig {
            log_dir: self.dir.clone(),
            level,
            rotation: LogRotation::Daily,
        }
    }
}

fn parse_duration(key: &str, value: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(value.trim())
        .with_context(|| format!("invalid duration for {}: '{}'", key, value))
}

impl Settings {
    /// Merge the settings file, environment and `cli` flags
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::load_with_env(cli, Environment::with_prefix(ENV_PREFIX))
    }

    pub(crate) fn load_with_env(cli: &Cli, env: Environment) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = &cli.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }
        builder = builder.add_source(env.prefix_separator("_").separator("__"));
        builder = apply_overrides(builder, cli)?;

        let settings = builder
            .build()
            .context("failed to load settings")?
            .try_deserialize::<Settings>()
            .context("invalid settings")?;
        Ok(settings)
    }
}

fn apply_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    cli: &Cli,
) -> anyhow::Result<ConfigBuilder<DefaultState>> {
    if let Some(v) = &cli.table {
        builder = builder.set_override("store.table_name", v.as_str())?;
    }
    if let Some(v) = &cli.region {
        builder = builder.set_override("store.region", v.as_str())?;
    }
    if let Some(v) = &cli.endpoint {
        builder = builder.set_override("store.endpoint", v.as_str())?;
    }
    if cli.disable_ssl {
        builder = builder.set_override("store.disable_ssl", true)?;
    }
    if let Some(v) = cli.ttl {
        builder = builder.set_override("lock.ttl", humantime::format_duration(v).to_string())?;
    }
    if let Some(v) = cli.reattempt {
        builder =
            builder.set_override("lock.reattempt", humantime::format_duration(v).to_string())?;
    }
    if let Some(v) = cli.cutoff {
        builder = builder.set_override("lock.cutoff", humantime::format_duration(v).to_string())?;
    }
    if let Some(v) = &cli.log_level {
        builder = builder.set_override("logging.level", v.as_str())?;
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use clap::Parser;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("condlock").chain(args.iter().copied())).unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(&cli(&["lock", "k"]), env(&[])).unwrap();
        let lock = settings.lock.to_lock_config().unwrap();

        assert_eq!(lock, LockConfig::default());
        assert_eq!(lock.ttl, Duration::from_secs(60));
        assert_eq!(lock.reattempt_wait, Duration::from_secs(1));
        assert_eq!(lock.cutoff, Duration::from_secs(120));
        assert_eq!(settings.store.table_name, "");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_environment_values() {
        let settings = Settings::load_with_env(
            &cli(&["lock", "k"]),
            env(&[
                ("CONDLOCK_STORE__TABLE_NAME", "locks"),
                ("CONDLOCK_STORE__REGION", "eu-west-1"),
                ("CONDLOCK_LOCK__TTL", "10s"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.store.table_name, "locks");
        assert_eq!(settings.store.region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            settings.lock.to_lock_config().unwrap().ttl,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_flags_override_environment() {
        let settings = Settings::load_with_env(
            &cli(&[
                "--table",
                "from-flag",
                "--endpoint",
                "localhost:8000",
                "--disable-ssl",
                "--cutoff",
                "0s",
                "--reattempt",
                "250ms",
                "unlock",
                "k",
            ]),
            env(&[("CONDLOCK_STORE__TABLE_NAME", "from-env")]),
        )
        .unwrap();

        assert_eq!(settings.store.table_name, "from-flag");
        assert_eq!(settings.store.endpoint.as_deref(), Some("localhost:8000"));
        assert!(settings.store.disable_ssl);
        let lock = settings.lock.to_lock_config().unwrap();
        assert_eq!(lock.cutoff, Duration::ZERO);
        assert_eq!(lock.reattempt_wait, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_duration_names_the_key() {
        let settings = LockSettings {
            ttl: "forever".to_string(),
            ..Default::default()
        };

        let err = settings.to_lock_config().unwrap_err();
        assert!(err.to_string().contains("lock.ttl"));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let logging = LogSettings {
            level: "chatty".to_string(),
            dir: None,
        };
        assert_eq!(logging.level(), None);
        assert_eq!(logging.logging_config().level, tracing::Level::INFO);
    }

    #[test]
    fn test_log_level_names_are_case_insensitive() {
        let logging = LogSettings {
            level: " DEBUG ".to_string(),
            dir: None,
        };
        assert_eq!(logging.level(), Some(tracing::Level::DEBUG));
        assert_eq!(logging.logging_config().level, tracing::Level::DEBUG);
    }
}
