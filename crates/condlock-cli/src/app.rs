use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use condlock_core::{LockConfig, LockService};
use condlock_dynamo::DynamoStore;

use crate::cli::Command;
use crate::settings::Settings;

/// Connect to the configured table and run `command` against it.
pub async fn run(command: &Command, settings: &Settings) -> anyhow::Result<String> {
    let lock = settings.lock.to_lock_config()?;
    let store = DynamoStore::connect(&settings.store)
        .await
        .context("could not connect to the lock table")?;
    info!(table = store.table_name(), key = command.key(), "Using lock table");

    let service = LockService::new(Arc::new(store));
    execute(&service, command, &lock).await
}

/// Run a single lock operation and describe the outcome
pub async fn execute(
    service: &LockService,
    command: &Command,
    lock: &LockConfig,
) -> anyhow::Result<String> {
    let mutex = service.mutex_from_config(command.key(), lock);
    match command {
        Command::Lock { key } => {
            mutex.lock().await.context("could not acquire lock")?;
            Ok(format!(
                "locked {} for {}",
                key,
                humantime::format_duration(mutex.ttl)
            ))
        }
        Command::Unlock { key } => {
            mutex.unlock().await;
            Ok(format!("unlocked {}", key))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use condlock_core::{LockError, ManualClock, MemoryStore, Store};

    use super::*;

    fn service() -> (LockService, Arc<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let service = LockService::new(store.clone()).with_clock(clock.clone());
        (service, store, clock)
    }

    fn lock(key: &str) -> Command {
        Command::Lock {
            key: key.to_string(),
        }
    }

    fn unlock(key: &str) -> Command {
        Command::Unlock {
            key: key.to_string(),
        }
    }

    fn config() -> LockConfig {
        LockConfig {
            ttl: Duration::from_secs(60),
            reattempt_wait: Duration::from_millis(300),
            cutoff: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_lock_reports_ttl() {
        let (service, store, _clock) = service();

        let message = execute(&service, &lock("deploy"), &config()).await.unwrap();

        assert_eq!(message, "locked deploy for 1m");
        assert!(store.get("deploy").is_some());
    }

    #[tokio::test]
    async fn test_unlock_releases_key() {
        let (service, store, _clock) = service();
        execute(&service, &lock("deploy"), &config()).await.unwrap();

        let message = execute(&service, &unlock("deploy"), &config()).await.unwrap();

        assert_eq!(message, "unlocked deploy");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unlock_of_free_key_succeeds() {
        let (service, _store, _clock) = service();

        let message = execute(&service, &unlock("never-held"), &config()).await.unwrap();
        assert_eq!(message, "unlocked never-held");
    }

    #[tokio::test]
    async fn test_lock_held_elsewhere_fails_after_cutoff() {
        let (service, store, clock) = service();
        store.acquire("deploy", Duration::from_secs(60)).await.unwrap();

        let err = execute(&service, &lock("deploy"), &config()).await.unwrap_err();

        assert_eq!(err.to_string(), "could not acquire lock");
        assert!(matches!(
            err.downcast_ref::<LockError>(),
            Some(LockError::CutoffExceeded { .. })
        ));
        assert!(clock.sleep_count() > 0);
    }
}
