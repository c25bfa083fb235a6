use super::*;
use crate::types::{RetryPolicy, RetryStrategy};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        strategy: RetryStrategy::FixedDelay,
        backoff_multiplier: 2.0,
        initial_delay_ms: 5,
        max_delay_ms: 50,
    }
}

fn timeout() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "timeout")
}

/// Operation that fails `failures` times, then succeeds
fn flaky(failures: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<Result<u32, io::Error>> {
    move || {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= failures {
            std::future::ready(Err(timeout()))
        } else {
            std::future::ready(Ok(call))
        }
    }
}

#[tokio::test]
async fn test_first_try_success() {
    let observer = Arc::new(StatsObserver::new());
    let calls = Arc::new(AtomicU32::new(0));

    let result = RetryExecutor::new(quick_policy(3))
        .with_observer(observer.clone())
        .execute(flaky(0, calls.clone()))
        .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(observer.attempt_starts(), 1);
    assert_eq!(observer.failures(), 0);
}

#[tokio::test]
async fn test_two_failures_then_success_uses_three_attempts() {
    let observer = Arc::new(StatsObserver::new());
    let calls = Arc::new(AtomicU32::new(0));

    let result = RetryExecutor::new(quick_policy(3))
        .with_observer(observer.clone())
        .execute(flaky(2, calls.clone()))
        .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(observer.failures(), 2);
    assert_eq!(observer.successes(), 1);
    assert_eq!(observer.exhaustions(), 0);
}

#[tokio::test]
async fn test_three_failures_exhaust_policy() {
    let observer = Arc::new(StatsObserver::new());
    let calls = Arc::new(AtomicU32::new(0));

    let err = RetryExecutor::new(quick_policy(3))
        .with_observer(observer.clone())
        .execute(flaky(u32::MAX, calls.clone()))
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(observer.attempt_starts(), 3);
    // the final failure is reported as exhaustion, not as a retryable failure
    assert_eq!(observer.failures(), 2);
    assert_eq!(observer.exhaustions(), 1);
    assert!(err.to_string().contains("gave up after 3 attempts"));
}

#[tokio::test]
async fn test_single_attempt_policy_never_retries() {
    let calls = Arc::new(AtomicU32::new(0));

    let err = RetryExecutor::new(RetryPolicy::single_attempt())
        .execute(flaky(1, calls.clone()))
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_attempts_still_tries_once() {
    let calls = Arc::new(AtomicU32::new(0));

    let result = RetryExecutor::new(quick_policy(0))
        .execute(flaky(0, calls.clone()))
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_predicate_stops_retrying() {
    let observer = Arc::new(StatsObserver::new());
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let err = RetryExecutor::new(quick_policy(3))
        .with_predicate(|e: &io::Error| e.kind() != io::ErrorKind::PermissionDenied)
        .with_observer(observer.clone())
        .execute(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied")) }
        })
        .await
        .unwrap_err();

    assert!(err.is_non_retryable());
    assert_eq!(err.attempts(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(observer.give_ups(), 1);
    assert_eq!(err.into_source().kind(), io::ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn test_fixed_delay_is_observed_between_attempts() {
    let policy = RetryPolicy {
        initial_delay_ms: 20,
        ..quick_policy(3)
    };
    let calls = Arc::new(AtomicU32::new(0));

    let started = Instant::now();
    let result = RetryExecutor::new(policy).execute(flaky(2, calls)).await;

    assert!(result.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(40));
}
