//! download-backup command

use anyhow::{Context as _, Result};
use secretstash_backup::{DownloadOptions, DownloadRunner, SealedStore};
use secretstash_envelope::{KmsKeyService, S3ObjectStore};
use std::io::Write;
use tracing::info;

use super::{Context, Locations};
use crate::cli::DownloadBackupArgs;
use crate::output;

pub async fn run(args: DownloadBackupArgs, context: &Context) -> Result<()> {
    let Locations { bundle, data_key } = context.locations(&args.bundle)?;
    let cipher = context.cipher(&args.bundle);

    let sdk_config = context.current_aws().await;
    let storage = S3ObjectStore::new(&sdk_config, context.endpoint());
    let kms = KmsKeyService::new(&sdk_config);
    let runner = DownloadRunner::new(SealedStore::new(&storage, &kms, cipher));

    let options = DownloadOptions { bundle, data_key };
    let document = runner
        .run(&options)
        .await
        .with_context(|| format!("Failed to download {}", options.bundle))?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("Failed to write {}", path))?;
            output::success(&format!("Wrote {} bytes to {}", document.len(), path));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&document)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
            info!(bytes = document.len(), "Wrote document to stdout");
        }
    }
    Ok(())
}
