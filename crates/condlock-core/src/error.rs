//! Error types for the lock protocol
//!
//! - `StoreError`: result of a single call against the backing store
//! - `LockError`: the only failure `Mutex::lock` surfaces to callers

use std::time::Duration;

/// Errors returned by a [`Store`](crate::store::Store) implementation.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The record exists and is still inside its TTL window.
    #[error("key is locked")]
    Locked,

    /// Connectivity, throttling or any other backend failure.
    #[error("store fault: {0}")]
    Fault(#[from] anyhow::Error),
}

impl StoreError {
    pub fn fault(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Fault(err.into())
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, StoreError::Locked)
    }
}

/// Errors returned by [`Mutex::lock`](crate::mutex::Mutex::lock).
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    #[error("reached cutoff time: lock '{name}' not acquired after {attempts} attempts in {elapsed:?}")]
    CutoffExceeded {
        name: String,
        attempts: u32,
        elapsed: Duration,
    },
}
