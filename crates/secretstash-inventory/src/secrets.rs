//! Secrets Manager secrets

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::primitives::DateTime;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType, RotationRulesType};
use aws_sdk_secretsmanager::Client;
use secretstash_core::{Error, Result};
use tracing::debug;

use crate::entry::{to_utc, RotationRules, SecretEntry, SecretListing, Tag};
use crate::enumerator::Inventory;
use crate::store::{Page, SecretStore};

/// Secrets as a backup inventory. Values are read one secret at a time;
/// a secret holding only binary data cannot be backed up.
pub struct SecretInventory<'a> {
    store: &'a dyn SecretStore,
}

impl<'a> SecretInventory<'a> {
    pub fn new(store: &'a dyn SecretStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Inventory for SecretInventory<'_> {
    type Listing = SecretListing;
    type Entry = SecretEntry;

    fn kind(&self) -> &'static str {
        "secret"
    }

    async fn list_page(&self, next_token: Option<&str>) -> Result<Page<SecretListing>> {
        self.store.list_secrets(None, next_token).await
    }

    async fn resolve(&self, identifier: &str) -> Result<SecretListing> {
        self.store.describe_secret(identifier).await
    }

    async fn fetch_batch(&self, listings: &[SecretListing]) -> Result<Vec<SecretEntry>> {
        let mut entries = Vec::with_capacity(listings.len());
        for listing in listings {
            let value = self
                .store
                .get_secret_value(listing.secret_id())
                .await?
                .ok_or_else(|| {
                    Error::unsupported_value(listing.name(), "secret has no string value")
                })?;
            entries.push(SecretEntry {
                listing: listing.clone(),
                secret_value: value,
            });
        }
        Ok(entries)
    }
}

/// AWS Secrets Manager
pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn timestamp(value: Option<&DateTime>) -> Option<chrono::DateTime<chrono::Utc>> {
    value.and_then(|d| to_utc(d.secs(), d.subsec_nanos()))
}

fn rotation_rules(rules: &RotationRulesType) -> RotationRules {
    RotationRules {
        automatically_after_days: rules.automatically_after_days(),
        duration: rules.duration().map(String::from),
        schedule_expression: rules.schedule_expression().map(String::from),
    }
}

// ListSecrets entries and DescribeSecret output share these accessors
// without sharing a type. Only the version map is named differently.
macro_rules! listing_from {
    ($src:expr, $stages:ident) => {{
        let src = $src;
        SecretListing {
            arn: src.arn().map(String::from),
            created_date: timestamp(src.created_date()),
            deleted_date: timestamp(src.deleted_date()),
            description: src.description().map(String::from),
            kms_key_id: src.kms_key_id().map(String::from),
            last_accessed_date: timestamp(src.last_accessed_date()),
            last_changed_date: timestamp(src.last_changed_date()),
            last_rotated_date: timestamp(src.last_rotated_date()),
            name: src.name().map(String::from),
            next_rotation_date: timestamp(src.next_rotation_date()),
            owning_service: src.owning_service().map(String::from),
            primary_region: src.primary_region().map(String::from),
            rotation_enabled: src.rotation_enabled(),
            rotation_lambda_arn: src.rotation_lambda_arn().map(String::from),
            rotation_rules: src.rotation_rules().map(rotation_rules),
            secret_versions_to_stages: src
                .$stages()
                .map(|stages| stages.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            tags: src.tags.as_ref().map(|tags| {
                tags.iter()
                    .map(|t| Tag {
                        key: t.key().map(String::from),
                        value: t.value().map(String::from),
                    })
                    .collect()
            }),
        }
    }};
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn list_secrets(
        &self,
        name_prefix: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<Page<SecretListing>> {
        let mut request = self
            .client
            .list_secrets()
            .set_next_token(next_token.map(String::from));
        if let Some(prefix) = name_prefix {
            request = request.filters(
                Filter::builder()
                    .key(FilterNameStringType::Name)
                    .values(prefix)
                    .build(),
            );
        }

        let output = request
            .send()
            .await
            .map_err(|e| Error::transport("secretsmanager:ListSecrets", DisplayErrorContext(&e)))?;

        let items: Vec<SecretListing> = output
            .secret_list()
            .iter()
            .map(|entry| listing_from!(entry, secret_versions_to_stages))
            .collect();
        debug!(count = items.len(), prefix = ?name_prefix, "Listed secrets");

        Ok(Page {
            items,
            next_token: output.next_token().map(String::from),
        })
    }

    async fn describe_secret(&self, secret_id: &str) -> Result<SecretListing> {
        let output = self
            .client
            .describe_secret()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                Error::transport(
                    format!("secretsmanager:DescribeSecret {}", secret_id),
                    DisplayErrorContext(&e),
                )
            })?;
        Ok(listing_from!(&output, version_ids_to_stages))
    }

    async fn get_secret_value(&self, secret_id: &str) -> Result<Option<String>> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                Error::transport(
                    format!("secretsmanager:GetSecretValue {}", secret_id),
                    DisplayErrorContext(&e),
                )
            })?;
        Ok(output.secret_string().map(String::from))
    }

    async fn put_secret_value(&self, secret_id: &str, value: &str) -> Result<()> {
        self.client
            .put_secret_value()
            .secret_id(secret_id)
            .secret_string(value)
            .send()
            .await
            .map_err(|e| {
                Error::transport(
                    format!("secretsmanager:PutSecretValue {}", secret_id),
                    DisplayErrorContext(&e),
                )
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::{collect_entries, Selection};
    use crate::memory::MemorySecretStore;

    #[tokio::test]
    async fn test_full_backup_reads_every_value() {
        let store = MemorySecretStore::new().with_page_size(2);
        for name in ["db", "api", "queue"] {
            store.insert(name, &format!("{}-value", name));
        }
        let inventory = SecretInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::All).await.unwrap();

        let pairs: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.name(), e.secret_value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("db", "db-value"), ("api", "api-value"), ("queue", "queue-value")]
        );
        assert!(entries[0].listing.arn.as_deref().unwrap().contains(":secret:db-"));
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_binary_secret_aborts_backup() {
        let store = MemorySecretStore::new();
        store.insert("db", "pw");
        store.insert_binary("certificate");
        let inventory = SecretInventory::new(&store);

        let err = collect_entries(&inventory, &Selection::All).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { ref name, .. } if name == "certificate"));
    }

    #[tokio::test]
    async fn test_single_secret_fast_path() {
        let store = MemorySecretStore::new();
        store.insert("db", "pw");
        store.insert("api", "token");
        let inventory = SecretInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::Single("api".into()))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].secret_value, "token");
        assert_eq!(store.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_single_secret_is_an_error() {
        let store = MemorySecretStore::new();
        let inventory = SecretInventory::new(&store);

        let err = collect_entries(&inventory, &Selection::Single("ghost".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[test]
    fn test_listing_copies_rotation_metadata() {
        let sdk_entry = aws_sdk_secretsmanager::types::SecretListEntry::builder()
            .name("db")
            .next_rotation_date(DateTime::from_secs(1_709_251_200))
            .rotation_rules(
                RotationRulesType::builder()
                    .automatically_after_days(30)
                    .build(),
            )
            .secret_versions_to_stages("v1", vec!["AWSCURRENT".to_string()])
            .build();

        let listing = listing_from!(&sdk_entry, secret_versions_to_stages);

        assert_eq!(listing.name(), "db");
        assert_eq!(
            listing.next_rotation_date.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert_eq!(listing.rotation_rules.unwrap().automatically_after_days, Some(30));
        assert_eq!(
            listing.secret_versions_to_stages.unwrap()["v1"],
            vec!["AWSCURRENT".to_string()]
        );
        assert!(listing.tags.is_none());
    }

    #[test]
    fn test_listing_keeps_empty_tag_list_distinct_from_missing() {
        let sdk_entry = aws_sdk_secretsmanager::types::SecretListEntry::builder()
            .name("db")
            .set_tags(Some(Vec::new()))
            .build();

        let listing = listing_from!(&sdk_entry, secret_versions_to_stages);
        assert_eq!(listing.tags, Some(Vec::new()));
    }
}
