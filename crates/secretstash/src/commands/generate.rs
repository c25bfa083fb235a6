//! generate-data-key command

use anyhow::{Context as _, Result};
use secretstash_envelope::{KeyCustodian, KmsKeyService, ObjectLocation, S3ObjectStore};

use super::{required, Context};
use crate::cli::GenerateDataKeyArgs;
use crate::output;

pub async fn run(args: GenerateDataKeyArgs, context: &Context) -> Result<()> {
    let location = location(&args, context)?;
    let master_key = required(
        &args.encryption_kms_key,
        &context.config.encryption.kms_key_id,
        "--encryption-kms-key",
    )?;
    let region = context.target_region(args.target_region.as_deref());

    output::header("Generate data key");
    output::kv("Region", region.unwrap_or("(from AWS profile)"));
    output::kv("KMS key", &master_key);
    output::kv("Location", &location.to_string());

    let sdk_config = context.target_aws(args.target_region.as_deref()).await;
    let storage = S3ObjectStore::new(&sdk_config, context.endpoint());
    let kms = KmsKeyService::new(&sdk_config);

    let spinner = output::spinner("Generating data key...");
    let key_id = KeyCustodian::new(&storage, &kms)
        .generate_data_key(&master_key, &location)
        .await
        .with_context(|| format!("Failed to store a data key at {}", location));
    spinner.finish_and_clear();
    let key_id = key_id?;

    output::success(&format!("Wrapped data key stored at {}", location));
    output::kv("Key id", &key_id);
    Ok(())
}

/// Bucket falls back to the configured data-key bucket, then the bundle bucket
fn location(args: &GenerateDataKeyArgs, context: &Context) -> Result<ObjectLocation> {
    let storage = &context.config.storage;
    let bucket = args
        .bucket_name
        .clone()
        .or_else(|| storage.data_key_bucket.clone())
        .or_else(|| storage.bucket.clone());
    let bucket = required(&bucket, &None, "--bucket-name")?;
    let key = required(&args.key, &storage.data_key_key, "--key")?;
    Ok(ObjectLocation::new(bucket, key))
}
