//! SSM parameters

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::Parameter;
use aws_sdk_ssm::Client;
use secretstash_core::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::entry::{to_utc, ParameterEntry};
use crate::enumerator::Inventory;
use crate::store::{Page, ParameterStore};

/// Parameters as a backup inventory.
///
/// Each batch is fetched twice: without decryption to capture the raw
/// stored value (`KmsKey`), and with decryption for the plaintext. The two
/// responses are joined by parameter name, and the batch comes back in the
/// order the names were requested.
pub struct ParameterInventory<'a> {
    store: &'a dyn ParameterStore,
}

impl<'a> ParameterInventory<'a> {
    pub fn new(store: &'a dyn ParameterStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Inventory for ParameterInventory<'_> {
    type Listing = String;
    type Entry = ParameterEntry;

    fn kind(&self) -> &'static str {
        "parameter"
    }

    async fn list_page(&self, next_token: Option<&str>) -> Result<Page<String>> {
        self.store.describe_parameters(next_token).await
    }

    async fn resolve(&self, identifier: &str) -> Result<String> {
        Ok(identifier.to_string())
    }

    async fn fetch_batch(&self, names: &[String]) -> Result<Vec<ParameterEntry>> {
        let raw = self.store.get_parameters(names, false).await?;
        let decrypted = self.store.get_parameters(names, true).await?;

        let mut raw_values: HashMap<String, String> =
            raw.into_iter().map(|p| (p.name, p.value)).collect();
        let mut decrypted: HashMap<String, ParameterEntry> =
            decrypted.into_iter().map(|p| (p.name.clone(), p)).collect();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let Some(mut entry) = decrypted.remove(name) else {
                warn!(name = %name, "Parameter vanished or is invalid, skipping");
                continue;
            };
            match raw_values.remove(name) {
                Some(raw_value) => entry.kms_key = raw_value,
                None => debug!(name = %name, "No raw value returned for parameter"),
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// AWS Systems Manager Parameter Store
pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn to_entry(parameter: &Parameter) -> ParameterEntry {
    ParameterEntry {
        arn: parameter.arn().map(String::from),
        data_type: parameter.data_type().map(String::from),
        last_modified_date: parameter
            .last_modified_date()
            .and_then(|d| to_utc(d.secs(), d.subsec_nanos())),
        name: parameter.name().unwrap_or_default().to_string(),
        selector: parameter.selector().map(String::from),
        source_result: parameter.source_result().map(String::from),
        r#type: parameter
            .r#type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        value: parameter.value().unwrap_or_default().to_string(),
        version: parameter.version(),
        kms_key: String::new(),
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn describe_parameters(&self, next_token: Option<&str>) -> Result<Page<String>> {
        let output = self
            .client
            .describe_parameters()
            .set_next_token(next_token.map(String::from))
            .send()
            .await
            .map_err(|e| Error::transport("ssm:DescribeParameters", DisplayErrorContext(&e)))?;

        Ok(Page {
            items: output
                .parameters()
                .iter()
                .filter_map(|p| p.name().map(String::from))
                .collect(),
            next_token: output.next_token().map(String::from),
        })
    }

    async fn get_parameters(
        &self,
        names: &[String],
        with_decryption: bool,
    ) -> Result<Vec<ParameterEntry>> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(|e| Error::transport("ssm:GetParameters", DisplayErrorContext(&e)))?;

        if !output.invalid_parameters().is_empty() {
            debug!(invalid = ?output.invalid_parameters(), "GetParameters reported invalid names");
        }
        Ok(output.parameters().iter().map(to_entry).collect())
    }

    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<ParameterEntry>> {
        match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await
        {
            Ok(output) => Ok(output.parameter().map(to_entry)),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|service_error| service_error.is_parameter_not_found())
                {
                    return Ok(None);
                }
                Err(Error::transport(
                    format!("ssm:GetParameter {}", name),
                    DisplayErrorContext(&e),
                ))
            }
        }
    }

    async fn put_parameter(&self, name: &str, value: &str) -> Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| {
                Error::transport(format!("ssm:PutParameter {}", name), DisplayErrorContext(&e))
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::{collect_entries, Selection};
    use crate::memory::MemoryParameterStore;

    fn store_with(count: usize) -> MemoryParameterStore {
        let store = MemoryParameterStore::new().with_page_size(4);
        for n in 0..count {
            store.insert(&format!("/app/p{:02}", n), "SecureString", &format!("value-{}", n));
        }
        store
    }

    #[tokio::test]
    async fn test_full_backup_pairs_raw_and_decrypted_values() {
        let store = store_with(12);
        let inventory = ParameterInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::All).await.unwrap();

        assert_eq!(entries.len(), 12);
        for (n, entry) in entries.iter().enumerate() {
            assert_eq!(entry.name, format!("/app/p{:02}", n));
            assert_eq!(entry.value, format!("value-{}", n));
            assert_eq!(entry.kms_key, MemoryParameterStore::raw_value_of(&entry.name));
        }

        // two calls (raw + decrypted) for each of the two batches
        let calls = store.get_parameters_calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].0.len(), 10);
        assert!(!calls[0].1);
        assert!(calls[1].1);
        assert_eq!(calls[0].0, calls[1].0);
        assert_eq!(calls[2].0.len(), 2);
    }

    #[tokio::test]
    async fn test_pairing_survives_reordered_responses() {
        let store = store_with(5).with_reversed_raw_responses();
        let inventory = ParameterInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::All).await.unwrap();

        for entry in &entries {
            assert_eq!(entry.kms_key, MemoryParameterStore::raw_value_of(&entry.name));
        }
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["/app/p00", "/app/p01", "/app/p02", "/app/p03", "/app/p04"]);
    }

    #[tokio::test]
    async fn test_pairing_survives_partial_responses() {
        let store = store_with(3)
            .omit_from_raw("/app/p00")
            .omit_from_decrypted("/app/p02");
        let inventory = ParameterInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::All).await.unwrap();

        // p00 has no raw value, p02 has no decrypted value and is dropped
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "/app/p00");
        assert_eq!(entries[0].value, "value-0");
        assert_eq!(entries[0].kms_key, "");
        assert_eq!(entries[1].name, "/app/p01");
        assert_eq!(entries[1].value, "value-1");
        assert_eq!(entries[1].kms_key, MemoryParameterStore::raw_value_of("/app/p01"));
    }

    #[tokio::test]
    async fn test_plain_string_parameter_keeps_its_value_as_kms_key() {
        let store = MemoryParameterStore::new();
        store.insert("/app/region", "String", "ap-northeast-1");
        let inventory = ParameterInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::All).await.unwrap();
        assert_eq!(entries[0].value, "ap-northeast-1");
        assert_eq!(entries[0].kms_key, "ap-northeast-1");
    }

    #[tokio::test]
    async fn test_single_parameter_fast_path() {
        let store = store_with(30);
        let inventory = ParameterInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::Single("/app/p17".into()))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "value-17");
        assert_eq!(store.describe_calls(), 0);
        assert_eq!(store.get_parameters_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_single_parameter_yields_nothing() {
        let store = store_with(3);
        let inventory = ParameterInventory::new(&store);

        let entries = collect_entries(&inventory, &Selection::Single("/app/missing".into()))
            .await
            .unwrap();
        assert!(entries.is_empty());
    }
}
