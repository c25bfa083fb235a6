//! Delay calculation and retry predicates

use crate::types::{RetryPolicy, RetryStrategy};
use std::time::Duration;

/// Pause to take after `attempt` (1-indexed) failed.
///
/// ```rust
/// use secretstash_core::retry::calculate_delay;
/// use secretstash_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::fixed(3, 2000);
/// assert_eq!(calculate_delay(&policy, 1).as_millis(), 2000);
/// assert_eq!(calculate_delay(&policy, 2).as_millis(), 2000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let index = attempt.saturating_sub(1);

    let delay_ms = match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => policy.initial_delay_ms,
        RetryStrategy::ExponentialBackoff => {
            let factor = policy.backoff_multiplier.powf(index as f64);
            (policy.initial_delay_ms as f64 * factor) as u64
        }
        RetryStrategy::LinearBackoff => policy.initial_delay_ms.saturating_mul(index as u64 + 1),
    };

    Duration::from_millis(delay_ms.min(policy.max_delay_ms))
}

/// Decides whether a failed attempt is worth repeating
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Retries every error
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

impl<E: ?Sized, F> RetryPredicate<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        self(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(strategy: RetryStrategy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            strategy,
            backoff_multiplier: 2.0,
            initial_delay_ms: 100,
            max_delay_ms: 350,
        }
    }

    #[test]
    fn test_none_never_waits() {
        let p = policy(RetryStrategy::None);
        assert!(calculate_delay(&p, 1).is_zero());
        assert!(calculate_delay(&p, 4).is_zero());
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let p = policy(RetryStrategy::FixedDelay);
        assert_eq!(calculate_delay(&p, 1), Duration::from_millis(100));
        assert_eq!(calculate_delay(&p, 3), Duration::from_millis(100));
    }

    #[test]
    fn test_growing_strategies_are_capped() {
        let p = policy(RetryStrategy::ExponentialBackoff);
        assert_eq!(calculate_delay(&p, 1), Duration::from_millis(100));
        assert_eq!(calculate_delay(&p, 2), Duration::from_millis(200));
        assert_eq!(calculate_delay(&p, 3), Duration::from_millis(350));

        let p = policy(RetryStrategy::LinearBackoff);
        assert_eq!(calculate_delay(&p, 2), Duration::from_millis(200));
        assert_eq!(calculate_delay(&p, 3), Duration::from_millis(300));
        assert_eq!(calculate_delay(&p, 4), Duration::from_millis(350));
    }

    #[test]
    fn test_closure_predicate() {
        let only_odd = |n: &u32| n % 2 == 1;
        assert!(RetryPredicate::<u32>::should_retry(&only_odd, &3));
        assert!(!RetryPredicate::<u32>::should_retry(&only_odd, &4));
        assert!(RetryPredicate::<u32>::should_retry(&AlwaysRetry, &4));
    }
}
