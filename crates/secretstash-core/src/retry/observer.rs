//! Hooks for watching retry attempts

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Receives a callback for every step of a retried operation.
///
/// Errors are passed as display strings so the observer does not need to be
/// generic over the operation's error type.
pub trait RetryObserver: Send + Sync {
    /// An attempt (1-indexed) is about to run
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// An attempt failed and another will follow after `delay`
    fn on_attempt_failed(&self, attempt: u32, error: &str, delay: Duration);

    /// An attempt succeeded
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// The last allowed attempt failed
    fn on_exhausted(&self, attempts: u32, error: &str);

    /// The predicate refused to retry
    fn on_gave_up(&self, attempt: u32, error: &str) {
        let _ = (attempt, error);
    }
}

impl<O: RetryObserver + ?Sized> RetryObserver for Arc<O> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &str, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        (**self).on_success(attempt, total_duration)
    }

    fn on_exhausted(&self, attempts: u32, error: &str) {
        (**self).on_exhausted(attempts, error)
    }

    fn on_gave_up(&self, attempt: u32, error: &str) {
        (**self).on_gave_up(attempt, error)
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &str, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _error: &str) {}
}

/// Logs retry events through `tracing`.
///
/// | event            | level                                  |
/// |------------------|----------------------------------------|
/// | attempt start    | DEBUG                                  |
/// | attempt failed   | WARN                                   |
/// | success          | INFO after a retry, DEBUG on first try |
/// | exhausted        | ERROR                                  |
/// | gave up          | WARN                                   |
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// `operation` names the call in every log line (e.g. "ssm:PutParameter /app/db")
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt,
            max_attempts,
            "Starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &str, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, retrying"
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt,
                duration_ms = total_duration.as_millis() as u64,
                "Succeeded after retry"
            );
        } else {
            tracing::debug!(operation = %self.operation, "Succeeded on first attempt");
        }
    }

    fn on_exhausted(&self, attempts: u32, error: &str) {
        tracing::error!(
            operation = %self.operation,
            attempts,
            error = %error,
            "All attempts failed"
        );
    }

    fn on_gave_up(&self, attempt: u32, error: &str) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            "Error is not retryable"
        );
    }
}

/// Counts events; handy in tests
#[derive(Debug, Default)]
pub struct StatsObserver {
    starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    give_ups: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn give_ups(&self) -> u32 {
        self.give_ups.load(Ordering::SeqCst)
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &str, _delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _error: &str) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_gave_up(&self, _attempt: u32, _error: &str) {
        self.give_ups.fetch_add(1, Ordering::SeqCst);
    }
}
