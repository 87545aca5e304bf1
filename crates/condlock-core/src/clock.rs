//! Time source and suspend primitive used by the retry loop
//!
//! The mutex never calls the system clock or `tokio::time::sleep` directly.
//! Production code uses [`TokioClock`]; tests substitute [`ManualClock`] to
//! assert cutoff and reattempt timing without real delay.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Clock and sleeper capability.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic instant, used for cutoff deadlines.
    fn now(&self) -> Instant;

    /// Wall-clock time in Unix milliseconds, used for record timestamps.
    fn unix_millis(&self) -> i64;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by `tokio::time`, so paused test runtimes are honored.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn unix_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Controllable clock.
///
/// `sleep` returns immediately after advancing virtual time by the requested
/// duration, and every requested duration is recorded.
pub struct ManualClock {
    origin: Instant,
    origin_millis: i64,
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(1_424_385_592_000)
    }

    /// Create a clock whose wall time starts at `unix_millis`.
    pub fn starting_at(unix_millis: i64) -> Self {
        Self {
            origin: Instant::now(),
            origin_millis: unix_millis,
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Move virtual time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.state.lock().offset += duration;
    }

    /// Virtual time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.state.lock().offset
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().sleeps.clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.state.lock().sleeps.len()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.state.lock().offset
    }

    fn unix_millis(&self) -> i64 {
        self.origin_millis + self.state.lock().offset.as_millis() as i64
    }

    async fn sleep(&self, duration: Duration) {
        let mut state = self.state.lock();
        state.offset += duration;
        state.sleeps.push(duration);
    }
}
