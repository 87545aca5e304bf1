//! Lock factory
//!
//! `LockService` binds one shared [`Store`] (plus clock and observer) to any
//! number of [`Mutex`] instances, for the same or different names.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, TokioClock};
use crate::mutex::{Locker, Mutex};
use crate::observer::{LockObserver, TracingObserver};
use crate::store::Store;

pub use crate::mutex::DEFAULT_REATTEMPT_WAIT;

/// Default lock TTL (1 minute)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default cutoff for `lock` (2 minutes)
pub const DEFAULT_CUTOFF: Duration = Duration::from_secs(120);

/// Lock parameters
///
/// Durations are (de)serialized as integer milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    #[serde(rename = "ttlMs", with = "duration_ms")]
    pub ttl: Duration,
    #[serde(rename = "reattemptWaitMs", with = "duration_ms")]
    pub reattempt_wait: Duration,
    #[serde(rename = "cutoffMs", with = "duration_ms")]
    pub cutoff: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            reattempt_wait: DEFAULT_REATTEMPT_WAIT,
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Constructs locks bound to a shared store
pub trait LockFactory: Send + Sync {
    fn new_lock(
        &self,
        name: &str,
        ttl: Duration,
        reattempt_wait: Duration,
        cutoff: Duration,
    ) -> Box<dyn Locker>;
}

/// Lock factory over a single store instance
#[derive(Clone)]
pub struct LockService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn LockObserver>,
}

impl LockService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clock: Arc::new(TokioClock),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Create a mutex, copying the four parameters verbatim
    pub fn mutex(
        &self,
        name: impl Into<String>,
        ttl: Duration,
        reattempt_wait: Duration,
        cutoff: Duration,
    ) -> Mutex {
        Mutex::new(name, ttl, self.store.clone())
            .with_reattempt_wait(reattempt_wait)
            .with_cutoff(cutoff)
            .with_clock(self.clock.clone())
            .with_observer(self.observer.clone())
    }

    pub fn mutex_from_config(&self, name: impl Into<String>, config: &LockConfig) -> Mutex {
        self.mutex(name, config.ttl, config.reattempt_wait, config.cutoff)
    }
}

impl LockFactory for LockService {
    fn new_lock(
        &self,
        name: &str,
        ttl: Duration,
        reattempt_wait: Duration,
        cutoff: Duration,
    ) -> Box<dyn Locker> {
        Box::new(self.mutex(name, ttl, reattempt_wait, cutoff))
    }
}
