//! Custody of the data key
//!
//! The wrapped data key sits in object storage. Every run fetches it and
//! asks KMS to unwrap it; nothing is cached between runs, and a KMS failure
//! ends the run.

use secretstash_core::Result;
use tracing::{debug, info};

use crate::key::DataKey;
use crate::kms::{GeneratedDataKey, KeyService};
use crate::storage::{ObjectLocation, ObjectStore};

/// Object tag recording which master key wrapped the stored data key
pub const KEY_ID_TAG: &str = "KeyId";

pub struct KeyCustodian<'a> {
    store: &'a dyn ObjectStore,
    kms: &'a dyn KeyService,
}

impl<'a> KeyCustodian<'a> {
    pub fn new(store: &'a dyn ObjectStore, kms: &'a dyn KeyService) -> Self {
        Self { store, kms }
    }

    /// Download the wrapped key at `location` and unwrap it
    pub async fn fetch_data_key(&self, location: &ObjectLocation) -> Result<DataKey> {
        let wrapped = self.store.get_object(location).await?;
        debug!(location = %location, bytes = wrapped.len(), "Fetched wrapped data key");

        let key = self.kms.decrypt(&wrapped).await?;
        info!(location = %location, "Unwrapped data key");
        Ok(key)
    }

    /// Generate a data key under `master_key_id` and store its wrapped form
    /// at `location`, tagged with the id KMS reports. Returns that id.
    pub async fn generate_data_key(
        &self,
        master_key_id: &str,
        location: &ObjectLocation,
    ) -> Result<String> {
        let GeneratedDataKey {
            key_id,
            wrapped,
            plaintext,
        } = self.kms.generate_data_key(master_key_id).await?;
        // only the wrapped half is ever stored
        drop(plaintext);

        self.store
            .put_object(location, wrapped, &[(KEY_ID_TAG.to_string(), key_id.clone())])
            .await?;
        info!(location = %location, key_id = %key_id, "Stored wrapped data key");
        Ok(key_id)
    }
}
