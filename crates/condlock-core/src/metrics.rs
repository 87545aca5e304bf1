// Metrics module for lock observability
// Counters and histograms published through the `metrics` facade

use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};

/// Initialize metric descriptions
/// Call once at startup, after installing a recorder
pub fn describe_metrics() {
    describe_counter!(
        "condlock_acquire_attempts_total",
        "Total number of store acquire attempts by outcome"
    );
    describe_counter!(
        "condlock_lock_total",
        "Total number of lock calls by final outcome"
    );
    describe_histogram!(
        "condlock_lock_wait_seconds",
        "Time spent inside lock before it returned"
    );
    describe_counter!(
        "condlock_unlock_total",
        "Total number of unlock calls by final outcome"
    );
}

/// Record one store acquire attempt ("acquired", "contended" or "fault")
pub fn record_acquire_attempt(outcome: &'static str) {
    counter!("condlock_acquire_attempts_total", "outcome" => outcome).increment(1);
}

/// Record the final outcome of a lock call ("locked" or "cutoff")
pub fn record_lock(outcome: &'static str, waited: Duration) {
    counter!("condlock_lock_total", "outcome" => outcome).increment(1);
    histogram!("condlock_lock_wait_seconds", "outcome" => outcome).record(waited.as_secs_f64());
}

/// Record the final outcome of an unlock call ("released" or "abandoned")
pub fn record_unlock(outcome: &'static str) {
    counter!("condlock_unlock_total", "outcome" => outcome).increment(1);
}
