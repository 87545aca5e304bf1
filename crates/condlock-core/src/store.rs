//! Backing store contract
//!
//! All safety of the lock derives from `Store::acquire` being a single atomic
//! compare-and-set at the store layer. The mutex never locks the record itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Atomic conditional-write store shared by all lock participants.
///
/// Implementations must tolerate any number of concurrent callers for the
/// same or different names.
#[async_trait]
pub trait Store: Send + Sync {
    /// Set `Created = now` for `name` if no record exists or the existing
    /// record's `Created < now - ttl`.
    ///
    /// Returns `StoreError::Locked` when the record is still within its TTL
    /// window and `StoreError::Fault` for anything else.
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove the record for `name`. Absent records are not an error.
    async fn delete(&self, name: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<(), StoreError> {
        (**self).acquire(name, ttl).await
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        (**self).delete(name).await
    }
}

/// Persisted lock record. One per lock name.
///
/// There is no owner and no fencing token: anyone may overwrite a stale
/// record or delete a live one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    #[serde(rename = "Name")]
    pub name: String,
    /// Unix milliseconds of the last successful acquisition
    #[serde(rename = "Created")]
    pub created: i64,
}

impl LockRecord {
    pub fn new(name: impl Into<String>, created: i64) -> Self {
        Self {
            name: name.into(),
            created,
        }
    }

    /// Oldest `created` value that still counts as held at `now_millis`.
    pub fn stale_before(now_millis: i64, ttl: Duration) -> i64 {
        now_millis.saturating_sub(ttl.as_millis().min(i64::MAX as u128) as i64)
    }

    /// Whether the next acquire may overwrite this record.
    pub fn is_stale(&self, now_millis: i64, ttl: Duration) -> bool {
        self.created < Self::stale_before(now_millis, ttl)
    }
}
