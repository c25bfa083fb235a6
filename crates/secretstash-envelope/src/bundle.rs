//! Encrypted backup bundles
//!
//! A bundle is stored as two objects: the ciphertext at `<key>` and the
//! nonce at `<key>.nonce`. Writing is not atomic. The ciphertext is written
//! first; if the nonce write then fails, the ciphertext object is left
//! behind without a usable nonce and nothing cleans it up.

use secretstash_core::Result;
use tracing::{debug, info};

use crate::storage::{ObjectLocation, ObjectStore};

/// Suffix appended to the bundle key for the nonce object
pub const NONCE_SUFFIX: &str = ".nonce";

/// Ciphertext and the nonce it was sealed with
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBundle {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
}

impl EncryptedBundle {
    /// Location of the nonce object belonging to `location`
    pub fn nonce_location(location: &ObjectLocation) -> ObjectLocation {
        location.with_suffix(NONCE_SUFFIX)
    }

    /// Write ciphertext, then nonce
    pub async fn store(&self, store: &dyn ObjectStore, location: &ObjectLocation) -> Result<()> {
        let nonce_location = Self::nonce_location(location);

        store
            .put_object(location, self.ciphertext.clone(), &[])
            .await?;
        debug!(location = %location, bytes = self.ciphertext.len(), "Wrote ciphertext");

        store
            .put_object(&nonce_location, self.nonce.clone(), &[])
            .await?;
        debug!(location = %nonce_location, "Wrote nonce");

        info!(location = %location, "Stored encrypted bundle");
        Ok(())
    }

    /// Read both halves. A missing half is `Error::ObjectNotFound`.
    pub async fn load(store: &dyn ObjectStore, location: &ObjectLocation) -> Result<Self> {
        let ciphertext = store.get_object(location).await?;
        let nonce = store.get_object(&Self::nonce_location(location)).await?;
        debug!(
            location = %location,
            bytes = ciphertext.len(),
            "Loaded encrypted bundle"
        );
        Ok(Self { ciphertext, nonce })
    }
}

impl std::fmt::Debug for EncryptedBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBundle")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("nonce_len", &self.nonce.len())
            .finish()
    }
}
