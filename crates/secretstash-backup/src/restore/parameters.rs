//! Restoring parameters by exact name

use async_trait::async_trait;
use secretstash_core::types::RetryPolicy;
use secretstash_core::Result;
use secretstash_inventory::{ParameterEntry, ParameterStore};

use super::{RestoreTarget, TargetRef};

pub struct ParameterRestore<'a> {
    store: &'a dyn ParameterStore,
    policy: RetryPolicy,
}

impl<'a> ParameterRestore<'a> {
    pub fn new(store: &'a dyn ParameterStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }
}

#[async_trait]
impl RestoreTarget for ParameterRestore<'_> {
    type Entry = ParameterEntry;

    fn kind(&self) -> &'static str {
        "parameter"
    }

    fn source_name<'e>(&self, entry: &'e ParameterEntry) -> &'e str {
        &entry.name
    }

    fn backup_value<'e>(&self, entry: &'e ParameterEntry) -> &'e str {
        &entry.value
    }

    async fn find_targets(&self, entry: &ParameterEntry) -> Result<Vec<TargetRef>> {
        let found = self
            .store
            .get_parameters(std::slice::from_ref(&entry.name), false)
            .await?;
        Ok(found
            .into_iter()
            .filter(|p| p.name == entry.name)
            .map(|p| TargetRef::new(p.name.clone(), p.name))
            .collect())
    }

    // Decrypted, so a SecureString holding the placeholder compares equal
    async fn current_value(&self, target: &TargetRef) -> Result<Option<String>> {
        Ok(self
            .store
            .get_parameter(&target.id, true)
            .await?
            .map(|p| p.value))
    }

    async fn write(&self, target: &TargetRef, value: &str) -> Result<()> {
        self.store.put_parameter(&target.id, value).await
    }

    fn write_policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::{restore_entries, RestoreAction};
    use secretstash_core::Error;
    use secretstash_inventory::MemoryParameterStore;

    fn backed_up(name: &str, value: &str) -> ParameterEntry {
        ParameterEntry {
            name: name.to_string(),
            r#type: "SecureString".to_string(),
            value: value.to_string(),
            version: 4,
            ..Default::default()
        }
    }

    fn quick() -> RetryPolicy {
        RetryPolicy::fixed(3, 1)
    }

    #[tokio::test]
    async fn test_placeholder_is_overwritten() {
        let store = MemoryParameterStore::new();
        store.insert("/app/db", "SecureString", "DUMMY");
        let restore = ParameterRestore::new(&store, quick());

        let report = restore_entries(&restore, &[backed_up("/app/db", "s3cret")], false)
            .await
            .unwrap();

        assert_eq!(report.written(), 1);
        assert_eq!(store.value("/app/db").as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_live_value_is_left_alone() {
        let store = MemoryParameterStore::new();
        store.insert("/app/db", "String", "other");
        let restore = ParameterRestore::new(&store, quick());

        let report = restore_entries(&restore, &[backed_up("/app/db", "s3cret")], false)
            .await
            .unwrap();

        assert_eq!(report.outcomes[0].action, RestoreAction::NotPlaceholder);
        assert_eq!(store.put_attempts(), 0);
        assert_eq!(store.value("/app/db").as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn test_missing_parameter_is_reported() {
        let store = MemoryParameterStore::new();
        store.insert("/app/other", "String", "DUMMY");
        let restore = ParameterRestore::new(&store, quick());

        let report = restore_entries(&restore, &[backed_up("/app/db", "s3cret")], false)
            .await
            .unwrap();

        assert_eq!(report.outcomes[0].action, RestoreAction::NotFound);
        assert_eq!(report.outcomes[0].target, None);
        assert_eq!(store.put_attempts(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_by_default_writes_nothing() {
        let store = MemoryParameterStore::new();
        store.insert("/app/db", "SecureString", "DUMMY");
        let restore = ParameterRestore::new(&store, quick());

        let report = restore_entries(&restore, &[backed_up("/app/db", "s3cret")], true)
            .await
            .unwrap();

        assert_eq!(report.would_write(), 1);
        assert_eq!(store.put_attempts(), 0);
        assert_eq!(store.value("/app/db").as_deref(), Some("DUMMY"));
    }

    #[tokio::test]
    async fn test_two_failures_then_success() {
        let store = MemoryParameterStore::new();
        store.insert("/app/db", "SecureString", "DUMMY");
        store.fail_next_puts(2);
        let restore = ParameterRestore::new(&store, quick());

        let report = restore_entries(&restore, &[backed_up("/app/db", "s3cret")], false)
            .await
            .unwrap();

        assert_eq!(store.put_attempts(), 3);
        assert_eq!(
            report.outcomes[0].action,
            RestoreAction::Written { attempts: 3 }
        );
        assert_eq!(store.value("/app/db").as_deref(), Some("s3cret"));
    }

    #[tokio::test]
    async fn test_three_failures_exhaust_retries() {
        let store = MemoryParameterStore::new();
        store.insert("/app/db", "SecureString", "DUMMY");
        store.fail_next_puts(3);
        let restore = ParameterRestore::new(&store, quick());

        let err = restore_entries(&restore, &[backed_up("/app/db", "s3cret")], false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RetryExhausted { attempts: 3, .. }));
        assert_eq!(store.put_attempts(), 3);
        assert_eq!(store.value("/app/db").as_deref(), Some("DUMMY"));
    }
}
