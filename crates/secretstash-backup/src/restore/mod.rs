//! Restore runs
//!
//! A restore reads a bundle back, decodes the entry list, and walks it
//! once. For each entry the destination is looked up, its current value
//! is checked against [`PLACEHOLDER`], and only then is it written. A
//! missing destination or a live value is recorded and skipped; a write
//! that fails every attempt ends the run.

mod parameters;
mod policy;
mod secrets;

pub use parameters::ParameterRestore;
pub use policy::{decide, Decision, RestoreAction, RestoreOutcome, RestoreReport, PLACEHOLDER};
pub use secrets::SecretRestore;

use async_trait::async_trait;
use secretstash_core::retry::{RetryError, RetryExecutor, TracingObserver};
use secretstash_core::types::RetryPolicy;
use secretstash_core::{Error, Result};
use secretstash_envelope::ObjectLocation;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, warn};

use crate::sealed::SealedStore;

/// A destination entry a backed-up entry will be restored into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    /// Name shown in logs and reports
    pub name: String,
    /// Identifier passed to the destination service
    pub id: String,
}

impl TargetRef {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Destination of a restore: knows how to find, read, and overwrite the
/// live counterpart of a backed-up entry.
#[async_trait]
pub trait RestoreTarget: Send + Sync {
    /// Entry type stored in the backup document
    type Entry: DeserializeOwned + Send + Sync;

    /// "parameter" or "secret"
    fn kind(&self) -> &'static str;

    fn source_name<'e>(&self, entry: &'e Self::Entry) -> &'e str;

    /// The value that gets written back
    fn backup_value<'e>(&self, entry: &'e Self::Entry) -> &'e str;

    /// Destination entries matching `entry`; empty when there are none
    async fn find_targets(&self, entry: &Self::Entry) -> Result<Vec<TargetRef>>;

    /// Current value of `target`, `None` when it no longer exists
    async fn current_value(&self, target: &TargetRef) -> Result<Option<String>>;

    async fn write(&self, target: &TargetRef, value: &str) -> Result<()>;

    /// How writes to this destination are retried
    fn write_policy(&self) -> &RetryPolicy;
}

#[derive(Debug, Clone)]
pub struct RestoreOptions {
    pub bundle: ObjectLocation,
    pub data_key: ObjectLocation,
    /// Report would-be writes without performing them
    pub dry_run: bool,
}

pub struct RestoreRunner<'a> {
    sealed: SealedStore<'a>,
}

impl<'a> RestoreRunner<'a> {
    pub fn new(sealed: SealedStore<'a>) -> Self {
        Self { sealed }
    }

    pub async fn run<T>(&self, target: &T, options: &RestoreOptions) -> Result<RestoreReport>
    where
        T: RestoreTarget + ?Sized,
    {
        info!(location = %options.bundle, "Stage 1/3: Fetching and decrypting bundle");
        let document = self.sealed.open(&options.bundle, &options.data_key).await?;

        info!("Stage 2/3: Decoding backup document");
        let entries: Vec<T::Entry> = serde_json::from_slice(&document)?;
        drop(document);

        info!(
            kind = target.kind(),
            dry_run = options.dry_run,
            "Stage 3/3: Restoring {} entries",
            entries.len()
        );
        restore_entries(target, &entries, options.dry_run).await
    }
}

/// Apply the placeholder and dry-run gates to every entry, in order.
///
/// Recoverable errors (see [`Error::is_recoverable`]) are logged and
/// recorded as skips. Anything else, such as exhausted write retries or a
/// failed lookup, ends the run.
pub async fn restore_entries<T>(
    target: &T,
    entries: &[T::Entry],
    dry_run: bool,
) -> Result<RestoreReport>
where
    T: RestoreTarget + ?Sized,
{
    let mut report = RestoreReport::new(dry_run);

    for entry in entries {
        let source = target.source_name(entry);
        let matches = target.find_targets(entry).await?;

        if matches.is_empty() {
            let err = Error::not_found(target.kind(), source);
            warn!("{}", err);
            report.record(source, None, skipped_because(&err));
            continue;
        }
        if matches.len() > 1 {
            warn!(
                source,
                matches = matches.len(),
                "Several {}s match, checking each one",
                target.kind()
            );
        }

        for matched in &matches {
            let action = match restore_one(target, entry, matched, dry_run).await {
                Ok(action) => action,
                Err(err) if err.is_recoverable() => {
                    warn!("{}", err);
                    skipped_because(&err)
                }
                Err(err) => return Err(err),
            };
            report.record(source, Some(matched.name.as_str()), action);
        }
    }

    info!(
        written = report.written(),
        would_write = report.would_write(),
        skipped = report.skipped(),
        "Restore finished"
    );
    Ok(report)
}

/// Report entry for a recoverable error
fn skipped_because(err: &Error) -> RestoreAction {
    match err {
        Error::PolicyViolation { .. } => RestoreAction::NotPlaceholder,
        _ => RestoreAction::NotFound,
    }
}

/// Gate and write one destination. Skips come back as recoverable errors.
async fn restore_one<T>(
    target: &T,
    entry: &T::Entry,
    matched: &TargetRef,
    dry_run: bool,
) -> Result<RestoreAction>
where
    T: RestoreTarget + ?Sized,
{
    let Some(current) = target.current_value(matched).await? else {
        return Err(Error::not_found(target.kind(), &matched.name));
    };

    match decide(&current, dry_run) {
        Decision::Skip => Err(Error::policy_violation(
            &matched.name,
            format!("current value is not {}, leaving it alone", PLACEHOLDER),
        )),
        Decision::Report => {
            info!(destination = %matched.name, "[DRY RUN] Would restore {}", target.kind());
            Ok(RestoreAction::WouldWrite)
        }
        Decision::Write => {
            let attempts = write_with_retry(target, matched, target.backup_value(entry)).await?;
            info!(destination = %matched.name, attempts, "Restored {}", target.kind());
            Ok(RestoreAction::Written { attempts })
        }
    }
}

/// Write `value`, retrying transport failures under the target's policy.
/// Returns the number of attempts made.
async fn write_with_retry<T>(target: &T, matched: &TargetRef, value: &str) -> Result<u32>
where
    T: RestoreTarget + ?Sized,
{
    let executor = RetryExecutor::new(target.write_policy().clone())
        .with_predicate(|err: &Error| matches!(err, Error::Transport { .. }))
        .with_observer(TracingObserver::new(format!("write {}", matched.name)));

    let attempts = AtomicU32::new(0);
    let counter = &attempts;
    let outcome = executor
        .execute(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            target.write(matched, value)
        })
        .await;

    match outcome {
        Ok(()) => {
            let made = attempts.load(Ordering::SeqCst);
            debug!(destination = %matched.name, attempts = made, "Write accepted");
            Ok(made)
        }
        Err(RetryError::Exhausted {
            attempts, source, ..
        }) => Err(Error::RetryExhausted {
            target: matched.name.clone(),
            attempts,
            message: source.to_string(),
        }),
        Err(RetryError::NonRetryable { source, .. }) => Err(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Destination with fixed entries and a scripted sequence of write results
    struct ScriptedTarget {
        live: Vec<(String, String)>,
        vanished: Vec<String>,
        unreadable: Vec<String>,
        failures: Mutex<u32>,
        writes: Mutex<Vec<(String, String)>>,
        policy: RetryPolicy,
    }

    impl ScriptedTarget {
        fn new(live: &[(&str, &str)]) -> Self {
            Self {
                live: live
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect(),
                vanished: Vec::new(),
                unreadable: Vec::new(),
                failures: Mutex::new(0),
                writes: Mutex::new(Vec::new()),
                policy: RetryPolicy::fixed(3, 1),
            }
        }

        fn failing(mut self, failures: u32) -> Self {
            self.failures = Mutex::new(failures);
            self
        }

        /// Listed by `find_targets` but gone by the time its value is read
        fn vanishing(mut self, name: &str) -> Self {
            self.vanished.push(name.to_string());
            self
        }

        /// Reading the current value fails with a transport error
        fn unreadable(mut self, name: &str) -> Self {
            self.unreadable.push(name.to_string());
            self
        }

        fn writes(&self) -> Vec<(String, String)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RestoreTarget for ScriptedTarget {
        type Entry = (String, String);

        fn kind(&self) -> &'static str {
            "entry"
        }

        fn source_name<'e>(&self, entry: &'e Self::Entry) -> &'e str {
            &entry.0
        }

        fn backup_value<'e>(&self, entry: &'e Self::Entry) -> &'e str {
            &entry.1
        }

        async fn find_targets(&self, entry: &Self::Entry) -> Result<Vec<TargetRef>> {
            Ok(self
                .live
                .iter()
                .filter(|(n, _)| n == &entry.0)
                .map(|(n, _)| TargetRef::new(n.as_str(), n.as_str()))
                .collect())
        }

        async fn current_value(&self, target: &TargetRef) -> Result<Option<String>> {
            if self.unreadable.contains(&target.id) {
                return Err(Error::transport("read", "AccessDenied"));
            }
            if self.vanished.contains(&target.id) {
                return Ok(None);
            }
            Ok(self
                .live
                .iter()
                .find(|(n, _)| n == &target.id)
                .map(|(_, v)| v.clone()))
        }

        async fn write(&self, target: &TargetRef, value: &str) -> Result<()> {
            {
                let mut failures = self.failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(Error::transport("write", "connection reset"));
                }
            }
            self.writes
                .lock()
                .unwrap()
                .push((target.id.clone(), value.to_string()));
            Ok(())
        }

        fn write_policy(&self) -> &RetryPolicy {
            &self.policy
        }
    }

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_skips_do_not_stop_the_run() {
        let target = ScriptedTarget::new(&[("b", "live"), ("c", "DUMMY")]);
        let backup = entries(&[("a", "1"), ("b", "2"), ("c", "3")]);

        let report = restore_entries(&target, &backup, false).await.unwrap();

        let actions: Vec<_> = report.outcomes.iter().map(|o| o.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                RestoreAction::NotFound,
                RestoreAction::NotPlaceholder,
                RestoreAction::Written { attempts: 1 },
            ]
        );
        assert_eq!(target.writes(), vec![("c".to_string(), "3".to_string())]);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let target = ScriptedTarget::new(&[("a", "DUMMY")]);

        let report = restore_entries(&target, &entries(&[("a", "1")]), true)
            .await
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.outcomes[0].action, RestoreAction::WouldWrite);
        assert!(target.writes().is_empty());
    }

    #[tokio::test]
    async fn test_write_succeeds_on_third_attempt() {
        let target = ScriptedTarget::new(&[("a", "DUMMY")]).failing(2);

        let report = restore_entries(&target, &entries(&[("a", "1")]), false)
            .await
            .unwrap();

        assert_eq!(
            report.outcomes[0].action,
            RestoreAction::Written { attempts: 3 }
        );
        assert_eq!(target.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_write_aborts_the_run() {
        let target = ScriptedTarget::new(&[("a", "DUMMY"), ("b", "DUMMY")]).failing(3);

        let err = restore_entries(&target, &entries(&[("a", "1"), ("b", "2")]), false)
            .await
            .unwrap_err();

        match err {
            Error::RetryExhausted {
                target: name,
                attempts,
                ..
            } => {
                assert_eq!(name, "a");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
        assert!(target.writes().is_empty());
    }

    #[tokio::test]
    async fn test_destination_vanishing_before_read_is_skipped() {
        let target = ScriptedTarget::new(&[("a", "DUMMY"), ("b", "DUMMY")]).vanishing("a");

        let report = restore_entries(&target, &entries(&[("a", "1"), ("b", "2")]), false)
            .await
            .unwrap();

        assert_eq!(report.outcomes[0].target.as_deref(), Some("a"));
        assert_eq!(report.outcomes[0].action, RestoreAction::NotFound);
        assert_eq!(
            report.outcomes[1].action,
            RestoreAction::Written { attempts: 1 }
        );
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_recoverable() {
        let target = ScriptedTarget::new(&[("a", "DUMMY"), ("b", "DUMMY")]).unreadable("a");

        let err = restore_entries(&target, &entries(&[("a", "1"), ("b", "2")]), false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert!(target.writes().is_empty());
    }

    #[test]
    fn test_skip_reason_follows_error_kind() {
        assert_eq!(
            skipped_because(&Error::not_found("parameter", "/a")),
            RestoreAction::NotFound
        );
        assert_eq!(
            skipped_because(&Error::policy_violation("/a", "live value")),
            RestoreAction::NotPlaceholder
        );
    }
}
