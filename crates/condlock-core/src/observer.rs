//! Observability hook for the lock protocol
//!
//! `Mutex` reports what happens through a [`LockObserver`] instead of writing
//! logs itself. [`TracingObserver`] is the default and turns events into
//! `tracing` records and metric updates.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::metrics;

/// Something that happened inside `lock` or `unlock`
#[derive(Debug)]
pub enum LockEvent<'a> {
    /// Acquire failed because the record is held (expected contention)
    Contended { name: &'a str, attempt: u32 },
    /// Acquire failed for any other reason
    AcquireFault {
        name: &'a str,
        attempt: u32,
        error: &'a StoreError,
    },
    /// Acquire succeeded and `lock` is about to return
    Acquired {
        name: &'a str,
        attempts: u32,
        elapsed: Duration,
    },
    /// `lock` gave up
    CutoffExceeded {
        name: &'a str,
        attempts: u32,
        elapsed: Duration,
    },
    /// One delete attempt failed
    DeleteFault {
        name: &'a str,
        attempt: u32,
        error: &'a StoreError,
    },
    /// Delete succeeded
    Released { name: &'a str, attempts: u32 },
    /// Every delete attempt failed; the record is left for its TTL
    ReleaseAbandoned { name: &'a str, attempts: u32 },
}

/// Receiver of lock events
pub trait LockObserver: Send + Sync {
    fn on_event(&self, event: &LockEvent<'_>);
}

/// Observer that discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LockObserver for NoopObserver {
    fn on_event(&self, _event: &LockEvent<'_>) {}
}

/// Logs faults as warnings and publishes metrics.
///
/// Contention is counted but never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LockObserver for TracingObserver {
    fn on_event(&self, event: &LockEvent<'_>) {
        match *event {
            LockEvent::Contended { .. } => {
                metrics::record_acquire_attempt("contended");
            }
            LockEvent::AcquireFault {
                name,
                attempt,
                error,
            } => {
                metrics::record_acquire_attempt("fault");
                warn!(name = %name, attempt, error = %error, "Lock acquire failed");
            }
            LockEvent::Acquired {
                name,
                attempts,
                elapsed,
            } => {
                metrics::record_acquire_attempt("acquired");
                metrics::record_lock("locked", elapsed);
                debug!(name = %name, attempts, elapsed = ?elapsed, "Lock acquired");
            }
            LockEvent::CutoffExceeded {
                name,
                attempts,
                elapsed,
            } => {
                metrics::record_lock("cutoff", elapsed);
                debug!(name = %name, attempts, elapsed = ?elapsed, "Lock cutoff reached");
            }
            LockEvent::DeleteFault {
                name,
                attempt,
                error,
            } => {
                warn!(name = %name, attempt, error = %error, "Unlock failed");
            }
            LockEvent::Released { name, attempts } => {
                metrics::record_unlock("released");
                debug!(name = %name, attempts, "Lock released");
            }
            LockEvent::ReleaseAbandoned { name, attempts } => {
                metrics::record_unlock("abandoned");
                warn!(name = %name, attempts, "Giving up on unlock, record left to expire");
            }
        }
    }
}
