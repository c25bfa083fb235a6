//! Backup runs

use secretstash_core::Result;
use secretstash_envelope::{EncryptedBundle, ObjectLocation};
use secretstash_inventory::{collect_entries, Inventory, Selection};
use tracing::{info, warn};

use crate::sealed::SealedStore;

#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Where the bundle goes (`<key>` and `<key>.nonce`)
    pub bundle: ObjectLocation,
    /// Where the wrapped data key lives
    pub data_key: ObjectLocation,
    pub selection: Selection,
}

/// What a backup run wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReceipt {
    pub entries: usize,
    pub document_bytes: usize,
    pub ciphertext: ObjectLocation,
    pub nonce: ObjectLocation,
}

pub struct BackupRunner<'a> {
    sealed: SealedStore<'a>,
}

impl<'a> BackupRunner<'a> {
    pub fn new(sealed: SealedStore<'a>) -> Self {
        Self { sealed }
    }

    /// Collect entries from `inventory`, serialize them as a JSON array,
    /// and store the encrypted result. Any failure before the bundle is
    /// written leaves storage untouched.
    pub async fn run<I>(&self, inventory: &I, options: &BackupOptions) -> Result<BackupReceipt>
    where
        I: Inventory + ?Sized,
    {
        info!(
            kind = inventory.kind(),
            selection = ?options.selection,
            "Stage 1/3: Collecting entries"
        );
        let entries = collect_entries(inventory, &options.selection).await?;
        if entries.is_empty() {
            warn!(kind = inventory.kind(), "Nothing to back up, writing an empty document");
        }

        info!("Stage 2/3: Serializing {} entries", entries.len());
        let document = serde_json::to_vec(&entries)?;

        info!(location = %options.bundle, "Stage 3/3: Encrypting and storing bundle");
        self.sealed
            .seal(&document, &options.bundle, &options.data_key)
            .await?;

        Ok(BackupReceipt {
            entries: entries.len(),
            document_bytes: document.len(),
            ciphertext: options.bundle.clone(),
            nonce: EncryptedBundle::nonce_location(&options.bundle),
        })
    }
}
