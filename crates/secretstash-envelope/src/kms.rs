//! Key-management service seam

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::DataKeySpec;
use aws_sdk_kms::Client;
use secretstash_core::{Error, Result};
use tracing::debug;

use crate::key::DataKey;

/// A data key fresh from the key-management service
#[derive(Debug)]
pub struct GeneratedDataKey {
    /// ARN of the master key that wrapped the data key
    pub key_id: String,
    /// Wrapped (encrypted) data key, safe to store
    pub wrapped: Vec<u8>,
    pub plaintext: DataKey,
}

/// Generates and unwraps data keys
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Request a new 256-bit data key under `master_key_id`
    async fn generate_data_key(&self, master_key_id: &str) -> Result<GeneratedDataKey>;

    /// Unwrap a stored data key. The result is checked to be 32 bytes.
    async fn decrypt(&self, wrapped: &[u8]) -> Result<DataKey>;
}

/// AWS KMS
pub struct KmsKeyService {
    client: Client,
}

impl KmsKeyService {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl KeyService for KmsKeyService {
    async fn generate_data_key(&self, master_key_id: &str) -> Result<GeneratedDataKey> {
        debug!(master_key_id, "Requesting data key");
        let output = self
            .client
            .generate_data_key()
            .key_id(master_key_id)
            .key_spec(DataKeySpec::Aes256)
            .send()
            .await
            .map_err(|e| Error::transport("kms:GenerateDataKey", DisplayErrorContext(&e)))?;

        let wrapped = output
            .ciphertext_blob()
            .ok_or_else(|| Error::transport("kms:GenerateDataKey", "response has no CiphertextBlob"))?
            .as_ref()
            .to_vec();
        let plaintext = output
            .plaintext()
            .ok_or_else(|| Error::transport("kms:GenerateDataKey", "response has no Plaintext"))?;

        Ok(GeneratedDataKey {
            key_id: output.key_id().unwrap_or(master_key_id).to_string(),
            wrapped,
            plaintext: DataKey::from_slice(plaintext.as_ref())?,
        })
    }

    async fn decrypt(&self, wrapped: &[u8]) -> Result<DataKey> {
        let output = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(wrapped.to_vec()))
            .send()
            .await
            .map_err(|e| Error::transport("kms:Decrypt", DisplayErrorContext(&e)))?;

        let plaintext = output
            .plaintext()
            .ok_or_else(|| Error::transport("kms:Decrypt", "response has no Plaintext"))?;
        debug!(key_id = output.key_id().unwrap_or("unknown"), "Unwrapped data key");
        DataKey::from_slice(plaintext.as_ref())
    }
}

impl std::fmt::Debug for KmsKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsKeyService")
            .field("region", &self.client.config().region())
            .finish()
    }
}
