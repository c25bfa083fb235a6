//! Sections of the secretstash.yaml configuration file

use super::{EncryptionAlgorithm, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Where bundles and wrapped data keys live
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageSettings {
    /// Bucket holding backup bundles
    #[serde(default)]
    pub bucket: Option<String>,

    /// Object key of the backup bundle
    #[serde(default)]
    pub key: Option<String>,

    /// Bucket holding the wrapped data key (defaults to `bucket`)
    #[serde(default)]
    pub data_key_bucket: Option<String>,

    /// Object key of the wrapped data key
    #[serde(default)]
    pub data_key_key: Option<String>,

    /// S3-compatible endpoint override (MinIO, LocalStack)
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Envelope encryption settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EncryptionSettings {
    #[serde(default)]
    pub algorithm: EncryptionAlgorithm,

    /// KMS master key used by `generate-data-key`
    #[serde(default)]
    pub kms_key_id: Option<String>,
}

/// Write retry policies for restore runs.
///
/// Parameters retry three times with a two second pause while secrets get a
/// single attempt. Both are overridable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RestoreSettings {
    #[serde(default = "default_parameter_writes")]
    pub parameter_writes: RetryPolicy,

    #[serde(default = "default_secret_writes")]
    pub secret_writes: RetryPolicy,
}

impl Default for RestoreSettings {
    fn default() -> Self {
        Self {
            parameter_writes: default_parameter_writes(),
            secret_writes: default_secret_writes(),
        }
    }
}

fn default_parameter_writes() -> RetryPolicy {
    RetryPolicy::fixed(3, 2000)
}

fn default_secret_writes() -> RetryPolicy {
    RetryPolicy::single_attempt()
}
