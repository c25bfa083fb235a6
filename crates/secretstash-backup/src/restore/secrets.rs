//! Restoring secrets into suffixed destinations
//!
//! A backed-up secret `db` restores into every destination secret whose
//! name starts with `db_`, e.g. `db_prod`.

use async_trait::async_trait;
use secretstash_core::types::RetryPolicy;
use secretstash_core::Result;
use secretstash_inventory::{SecretEntry, SecretStore};
use tracing::debug;

use super::{RestoreTarget, TargetRef};

pub struct SecretRestore<'a> {
    store: &'a dyn SecretStore,
    policy: RetryPolicy,
}

impl<'a> SecretRestore<'a> {
    pub fn new(store: &'a dyn SecretStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }
}

#[async_trait]
impl RestoreTarget for SecretRestore<'_> {
    type Entry = SecretEntry;

    fn kind(&self) -> &'static str {
        "secret"
    }

    fn source_name<'e>(&self, entry: &'e SecretEntry) -> &'e str {
        entry.name()
    }

    fn backup_value<'e>(&self, entry: &'e SecretEntry) -> &'e str {
        &entry.secret_value
    }

    async fn find_targets(&self, entry: &SecretEntry) -> Result<Vec<TargetRef>> {
        let prefix = format!("{}_", entry.name());
        let mut targets = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_secrets(Some(&prefix), next_token.as_deref())
                .await?;
            // The service filter ignores case and is not anchored as tightly
            targets.extend(
                page.items
                    .iter()
                    .filter(|listing| listing.name().starts_with(&prefix))
                    .map(|listing| TargetRef::new(listing.name(), listing.secret_id())),
            );

            match page.continuation() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(prefix = %prefix, matches = targets.len(), "Looked up restore targets");
        Ok(targets)
    }

    // A binary-only secret has no string value and reads as empty
    async fn current_value(&self, target: &TargetRef) -> Result<Option<String>> {
        Ok(Some(
            self.store
                .get_secret_value(&target.id)
                .await?
                .unwrap_or_default(),
        ))
    }

    async fn write(&self, target: &TargetRef, value: &str) -> Result<()> {
        self.store.put_secret_value(&target.id, value).await
    }

    fn write_policy(&self) -> &RetryPolicy {
        &self.policy
    }
}
