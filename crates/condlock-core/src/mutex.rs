//! Distributed mutex driven by repeated conditional writes
//!
//! `lock` calls `Store::acquire` until it succeeds or the cutoff deadline has
//! passed, sleeping a fixed `reattempt_wait` between attempts. There is no
//! backoff and no jitter. `unlock` is best-effort cleanup: up to three
//! immediate deletes, failures are reported to the observer only.
//!
//! No ownership or fencing token is stored. An `unlock` issued after the TTL
//! has lapsed can delete a record that now belongs to a later holder, and a
//! stalled holder can be superseded while it still believes it holds the
//! lock. Callers needing stronger guarantees must add fencing themselves.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::clock::{Clock, TokioClock};
use crate::error::{LockError, StoreError};
use crate::observer::{LockEvent, LockObserver, TracingObserver};
use crate::store::Store;

/// Wait used between attempts when `reattempt_wait` is zero
pub const DEFAULT_REATTEMPT_WAIT: Duration = Duration::from_secs(1);

/// Number of delete attempts made by `unlock`
pub const UNLOCK_ATTEMPTS: u32 = 3;

/// Lock that reports failure through an error rather than panicking.
#[async_trait]
pub trait Locker: Send + Sync {
    /// Block until the lock is acquired or the cutoff is reached.
    async fn lock(&self) -> Result<(), LockError>;

    /// Release the lock. Never reports failure.
    async fn unlock(&self);
}

/// A mutual exclusion lock over a shared [`Store`].
///
/// A zero `reattempt_wait` selects [`DEFAULT_REATTEMPT_WAIT`]; a zero
/// `cutoff` makes `lock` retry indefinitely.
pub struct Mutex {
    pub name: String,
    pub ttl: Duration,
    pub reattempt_wait: Duration,
    pub cutoff: Duration,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn LockObserver>,
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("reattempt_wait", &self.reattempt_wait)
            .field("cutoff", &self.cutoff)
            .finish_non_exhaustive()
    }
}

impl Mutex {
    pub fn new(name: impl Into<String>, ttl: Duration, store: Arc<dyn Store>) -> Self {
        Self {
            name: name.into(),
            ttl,
            reattempt_wait: Duration::ZERO,
            cutoff: Duration::ZERO,
            store,
            clock: Arc::new(TokioClock),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_reattempt_wait(mut self, reattempt_wait: Duration) -> Self {
        self.reattempt_wait = reattempt_wait;
        self
    }

    pub fn with_cutoff(mut self, cutoff: Duration) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn LockObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The wait actually used between attempts.
    pub fn effective_reattempt_wait(&self) -> Duration {
        if self.reattempt_wait.is_zero() {
            DEFAULT_REATTEMPT_WAIT
        } else {
            self.reattempt_wait
        }
    }

    /// Acquire the lock, retrying until success or cutoff.
    ///
    /// At least one acquire attempt is always made. The deadline is checked
    /// after each failed attempt, never before the first one.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::CutoffExceeded`] once a failed attempt finishes
    /// past `now + cutoff` (measured from entry). Contention and store faults
    /// are both retried and never returned.
    pub async fn lock(&self) -> Result<(), LockError> {
        let wait = self.effective_reattempt_wait();
        let started = self.clock.now();
        // Zero cutoff, or one too large to represent, means no deadline
        let deadline = if self.cutoff.is_zero() {
            None
        } else {
            started.checked_add(self.cutoff)
        };
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);

            match self.store.acquire(&self.name, self.ttl).await {
                Ok(()) => {
                    self.observer.on_event(&LockEvent::Acquired {
                        name: &self.name,
                        attempts,
                        elapsed: self.clock.now().saturating_duration_since(started),
                    });
                    return Ok(());
                }
                Err(StoreError::Locked) => {
                    self.observer.on_event(&LockEvent::Contended {
                        name: &self.name,
                        attempt: attempts,
                    });
                }
                Err(error) => {
                    self.observer.on_event(&LockEvent::AcquireFault {
                        name: &self.name,
                        attempt: attempts,
                        error: &error,
                    });
                }
            }

            let now = self.clock.now();
            if let Some(deadline) = deadline
                && now > deadline
            {
                let elapsed = now.saturating_duration_since(started);
                self.observer.on_event(&LockEvent::CutoffExceeded {
                    name: &self.name,
                    attempts,
                    elapsed,
                });
                return Err(LockError::CutoffExceeded {
                    name: self.name.clone(),
                    attempts,
                    elapsed,
                });
            }

            self.clock.sleep(wait).await;
        }
    }

    /// Delete the lock record, trying up to [`UNLOCK_ATTEMPTS`] times.
    ///
    /// Returns after the first successful delete. If every attempt fails the
    /// record is left for its TTL to expire; the caller is not told.
    pub async fn unlock(&self) {
        for attempt in 1..=UNLOCK_ATTEMPTS {
            match self.store.delete(&self.name).await {
                Ok(()) => {
                    self.observer.on_event(&LockEvent::Released {
                        name: &self.name,
                        attempts: attempt,
                    });
                    return;
                }
                Err(error) => {
                    self.observer.on_event(&LockEvent::DeleteFault {
                        name: &self.name,
                        attempt,
                        error: &error,
                    });
                }
            }
        }

        self.observer.on_event(&LockEvent::ReleaseAbandoned {
            name: &self.name,
            attempts: UNLOCK_ATTEMPTS,
        });
    }
}

#[async_trait]
impl Locker for Mutex {
    async fn lock(&self) -> Result<(), LockError> {
        Mutex::lock(self).await
    }

    async fn unlock(&self) {
        Mutex::unlock(self).await
    }
}
