//! Condlock Core - distributed mutex over a conditional-write store
//!
//! This crate provides:
//! - The `Store` contract (atomic acquire-if-free-or-stale, unconditional delete)
//! - `Mutex`, the retry/cutoff state machine behind `lock`/`unlock`
//! - `LockService`, the factory that binds a store to mutexes
//! - An injectable clock and observer so the protocol is testable
//! - `MemoryStore`, an in-process store implementation
//!
//! The protocol keeps no ownership or fencing token. See [`mutex`] for the
//! consequences.

pub mod clock;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod mutex;
pub mod observer;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, TokioClock};
pub use error::{LockError, StoreError};
pub use memory::MemoryStore;
pub use mutex::{DEFAULT_REATTEMPT_WAIT, Locker, Mutex, UNLOCK_ATTEMPTS};
pub use observer::{LockEvent, LockObserver, NoopObserver, TracingObserver};
pub use service::{DEFAULT_CUTOFF, DEFAULT_TTL, LockConfig, LockFactory, LockService};
pub use store::{LockRecord, Store};
