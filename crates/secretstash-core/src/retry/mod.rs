//! Policy-driven retry engine
//!
//! Restore writes run through this engine so that the number of attempts and
//! the pause between them come from a [`RetryPolicy`](crate::types::RetryPolicy)
//! instead of a loop hard-coded at each call site.
//!
//! ```rust,no_run
//! use secretstash_core::retry::{RetryExecutor, TracingObserver};
//! use secretstash_core::types::RetryPolicy;
//!
//! async fn example() {
//!     let result = RetryExecutor::new(RetryPolicy::fixed(3, 2000))
//!         .with_observer(TracingObserver::new("ssm:PutParameter"))
//!         .execute(|| async { Ok::<_, std::io::Error>(()) })
//!         .await;
//!     assert!(result.is_ok());
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::RetryExecutor;
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

#[cfg(test)]
mod tests;
