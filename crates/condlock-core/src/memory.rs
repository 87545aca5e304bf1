// In-memory lock store
// Single-process Store backed by DashMap; records are never expired in place

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::clock::{Clock, TokioClock};
use crate::error::StoreError;
use crate::store::{LockRecord, Store};

/// In-memory store using DashMap
///
/// The per-key entry guard makes the read-compare-write of `acquire` atomic.
pub struct MemoryStore {
    records: DashMap<String, LockRecord>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(TokioClock))
    }

    /// Create a store that stamps records using `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Get a copy of the record for `name`, if any
    pub fn get(&self, name: &str) -> Option<LockRecord> {
        self.records.get(name).map(|entry| entry.value().clone())
    }

    /// Insert or replace a record unconditionally
    pub fn insert(&self, record: LockRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn acquire(&self, name: &str, ttl: Duration) -> Result<(), StoreError> {
        let now = self.clock.unix_millis();

        match self.records.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_stale(now, ttl) {
                    return Err(StoreError::Locked);
                }
                entry.get_mut().created = now;
                debug!(name = %name, created = now, "Stale lock record taken over");
            }
            Entry::Vacant(entry) => {
                entry.insert(LockRecord::new(name, now));
                debug!(name = %name, created = now, "Lock record created");
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        if self.records.remove(name).is_some() {
            debug!(name = %name, "Lock record deleted");
        }
        Ok(())
    }
}
