//! CLI command implementations

pub mod backup;
pub mod download;
pub mod generate;
pub mod restore;
pub mod version;

use anyhow::Result;
use aws_config::SdkConfig;
use secretstash_core::types::EncryptionAlgorithm;
use secretstash_core::{Error, StashConfig};
use secretstash_envelope::{Cipher, ObjectLocation};

use crate::aws;
use crate::cli::BundleArgs;

/// Loaded configuration plus the global flags that apply to every command
pub struct Context {
    pub config: StashConfig,
    region: Option<String>,
    endpoint: Option<String>,
}

impl Context {
    pub fn new(config: StashConfig, region: Option<String>, endpoint: Option<String>) -> Self {
        Self {
            config,
            region,
            endpoint,
        }
    }

    /// Region of the current account, flag over file
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().or(self.config.region.as_deref())
    }

    /// Region holding bundles and keys during backup. Falls back to the
    /// current region.
    pub fn target_region<'a>(&'a self, flag: Option<&'a str>) -> Option<&'a str> {
        flag.or(self.config.target_region.as_deref())
            .or_else(|| self.region())
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .or(self.config.storage.endpoint.as_deref())
    }

    pub async fn current_aws(&self) -> SdkConfig {
        aws::load(self.region()).await
    }

    pub async fn target_aws(&self, flag: Option<&str>) -> SdkConfig {
        aws::load(self.target_region(flag)).await
    }

    pub fn cipher(&self, args: &BundleArgs) -> Cipher {
        Cipher::new(self.algorithm(args))
    }

    fn algorithm(&self, args: &BundleArgs) -> EncryptionAlgorithm {
        args.algorithm.unwrap_or(self.config.encryption.algorithm)
    }

    /// Bundle and data-key locations, flags over file. The data-key bucket
    /// defaults to the bundle bucket.
    pub fn locations(&self, args: &BundleArgs) -> Result<Locations> {
        let storage = &self.config.storage;
        let bucket = required(&args.bucket_name, &storage.bucket, "--bucket-name")?;
        let key = required(&args.key, &storage.key, "--key")?;
        let data_key_bucket = args
            .data_key_bucket_name
            .clone()
            .or_else(|| storage.data_key_bucket.clone())
            .unwrap_or_else(|| bucket.clone());
        let data_key_key = required(&args.data_key_key, &storage.data_key_key, "--data-key-key")?;

        Ok(Locations {
            bundle: ObjectLocation::new(bucket, key),
            data_key: ObjectLocation::new(data_key_bucket, data_key_key),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub bundle: ObjectLocation,
    pub data_key: ObjectLocation,
}

/// Flag value, else file value, else an error naming the flag
pub fn required(flag: &Option<String>, file: &Option<String>, name: &str) -> Result<String> {
    flag.clone()
        .or_else(|| file.clone())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::invalid_config(format!("{} is required", name)).into())
}
