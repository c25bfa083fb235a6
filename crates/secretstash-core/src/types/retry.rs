//! Retry policy types

use serde::{Deserialize, Serialize};

/// Retry policy for a write operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How the pause between attempts is computed
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Pause before the second attempt, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single pause, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// `attempts` tries with the same pause between each
    pub fn fixed(attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: attempts,
            strategy: RetryStrategy::FixedDelay,
            initial_delay_ms: delay_ms,
            ..Self::default()
        }
    }

    /// One try, no retry
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            strategy: RetryStrategy::None,
            initial_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Same policy with a different attempt count.
    ///
    /// A single-attempt policy has no pause to reuse, so raising it above one
    /// attempt switches it to the default fixed pause.
    pub fn with_attempts(&self, attempts: u32) -> Self {
        if attempts > 1 && self.max_attempts <= 1 && self.strategy == RetryStrategy::None {
            return Self::fixed(attempts, default_initial_delay());
        }
        Self {
            max_attempts: attempts,
            ..self.clone()
        }
    }
}

impl Default for RetryPolicy {
    /// Three attempts with a fixed two second pause
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    2000
}
fn default_max_delay() -> u64 {
    30000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// Retry immediately
    None,

    /// Same pause before every retry (default)
    #[default]
    FixedDelay,

    /// Pause grows by `backoff_multiplier` each attempt
    ExponentialBackoff,

    /// Pause grows by `initial_delay_ms` each attempt
    LinearBackoff,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_three_fixed_two_second_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.strategy, RetryStrategy::FixedDelay);
        assert_eq!(policy.initial_delay_ms, 2000);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let policy: RetryPolicy = serde_yaml_ng::from_str("max-attempts: 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.strategy, RetryStrategy::FixedDelay);
        assert_eq!(policy.initial_delay_ms, 2000);

        let policy: RetryPolicy =
            serde_yaml_ng::from_str("strategy: exponential-backoff\ninitial-delay-ms: 250")
                .unwrap();
        assert_eq!(policy.strategy, RetryStrategy::ExponentialBackoff);
        assert_eq!(policy.initial_delay_ms, 250);
    }

    #[test]
    fn test_single_attempt() {
        let policy = RetryPolicy::single_attempt();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.strategy, RetryStrategy::None);
    }

    #[test]
    fn test_raising_single_attempt_adds_fixed_pause() {
        let policy = RetryPolicy::single_attempt().with_attempts(3);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.strategy, RetryStrategy::FixedDelay);
        assert_eq!(policy.initial_delay_ms, 2000);

        // staying at one attempt keeps the policy as it was
        assert_eq!(
            RetryPolicy::single_attempt().with_attempts(1),
            RetryPolicy::single_attempt()
        );
    }

    #[test]
    fn test_with_attempts_keeps_configured_pause() {
        let policy = RetryPolicy::fixed(3, 500).with_attempts(5);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay_ms, 500);

        // an explicit no-pause policy with retries stays pause-free
        let immediate = RetryPolicy {
            max_attempts: 2,
            strategy: RetryStrategy::None,
            ..RetryPolicy::default()
        };
        assert_eq!(immediate.with_attempts(4).strategy, RetryStrategy::None);
    }
}
