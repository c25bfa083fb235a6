//! backup-parameters and backup-secrets commands
//!
//! Entries are read with the current account's credentials; the bundle and
//! the data key are reached through the target region.

use anyhow::{Context as _, Result};
use secretstash_backup::{BackupOptions, BackupReceipt, BackupRunner, SealedStore};
use secretstash_envelope::{KmsKeyService, S3ObjectStore};
use secretstash_inventory::{
    Inventory, ParameterInventory, SecretInventory, SecretsManagerStore, Selection,
    SsmParameterStore,
};

use super::{Context, Locations};
use crate::cli::{BackupParametersArgs, BackupSecretsArgs, BundleArgs};
use crate::output;

pub async fn run_parameters(args: BackupParametersArgs, context: &Context) -> Result<()> {
    let locations = context.locations(&args.bundle)?;
    let current = context.current_aws().await;
    let store = SsmParameterStore::new(&current);
    let inventory = ParameterInventory::new(&store);
    let selection = Selection::from_name(args.parameter_name.as_deref());

    run(
        "Back up parameters",
        &inventory,
        selection,
        locations,
        &args.bundle,
        args.target_region.as_deref(),
        context,
    )
    .await
}

pub async fn run_secrets(args: BackupSecretsArgs, context: &Context) -> Result<()> {
    let locations = context.locations(&args.bundle)?;
    let current = context.current_aws().await;
    let store = SecretsManagerStore::new(&current);
    let inventory = SecretInventory::new(&store);
    let selection = Selection::from_name(args.secret_name.as_deref());

    run(
        "Back up secrets",
        &inventory,
        selection,
        locations,
        &args.bundle,
        args.target_region.as_deref(),
        context,
    )
    .await
}

async fn run<I>(
    title: &str,
    inventory: &I,
    selection: Selection,
    locations: Locations,
    bundle: &BundleArgs,
    target_region: Option<&str>,
    context: &Context,
) -> Result<()>
where
    I: Inventory + ?Sized,
{
    let Locations { bundle: location, data_key } = locations;
    let cipher = context.cipher(bundle);

    output::header(title);
    output::kv("Bundle", &location.to_string());
    output::kv("Data key", &data_key.to_string());
    output::kv("Algorithm", cipher.algorithm().as_str());
    if let Selection::Single(name) = &selection {
        output::kv("Only", name);
    }

    let target = context.target_aws(target_region).await;
    let storage = S3ObjectStore::new(&target, context.endpoint());
    let kms = KmsKeyService::new(&target);
    let runner = BackupRunner::new(SealedStore::new(&storage, &kms, cipher));
    let options = BackupOptions {
        bundle: location,
        data_key,
        selection,
    };

    let spinner = output::spinner(&format!("Backing up {}s...", inventory.kind()));
    let receipt = runner.run(inventory, &options).await;
    spinner.finish_and_clear();
    let receipt = receipt.with_context(|| format!("Backup to {} failed", options.bundle))?;

    print_receipt(&receipt, inventory.kind());
    Ok(())
}

fn print_receipt(receipt: &BackupReceipt, kind: &str) {
    output::success(&format!("Backed up {} {}s", receipt.entries, kind));
    output::kv("Ciphertext", &receipt.ciphertext.to_string());
    output::kv("Nonce", &receipt.nonce.to_string());
    output::kv("Document size", &format!("{} bytes", receipt.document_bytes));
}
