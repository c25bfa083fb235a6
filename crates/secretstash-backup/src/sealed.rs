//! Sealing and opening backup documents

use secretstash_core::Result;
use secretstash_envelope::{
    Cipher, EncryptedBundle, KeyCustodian, KeyService, ObjectLocation, ObjectStore,
};
use tracing::debug;

/// Object storage plus KMS plus a cipher: everything needed to turn a
/// document into a stored bundle and back.
pub struct SealedStore<'a> {
    storage: &'a dyn ObjectStore,
    kms: &'a dyn KeyService,
    cipher: Cipher,
}

impl<'a> SealedStore<'a> {
    pub fn new(storage: &'a dyn ObjectStore, kms: &'a dyn KeyService, cipher: Cipher) -> Self {
        Self {
            storage,
            kms,
            cipher,
        }
    }

    fn custodian(&self) -> KeyCustodian<'a> {
        KeyCustodian::new(self.storage, self.kms)
    }

    /// Encrypt `document` under the data key at `data_key` and store the
    /// bundle at `bundle`. Returns the stored bundle.
    pub async fn seal(
        &self,
        document: &[u8],
        bundle: &ObjectLocation,
        data_key: &ObjectLocation,
    ) -> Result<EncryptedBundle> {
        let key = self.custodian().fetch_data_key(data_key).await?;
        let sealed = self.cipher.encrypt(key.as_bytes(), document)?;
        drop(key);
        debug!(algorithm = %self.cipher.algorithm(), bytes = document.len(), "Encrypted document");

        sealed.store(self.storage, bundle).await?;
        Ok(sealed)
    }

    /// Load the bundle at `bundle` and decrypt it with the data key at
    /// `data_key`
    pub async fn open(&self, bundle: &ObjectLocation, data_key: &ObjectLocation) -> Result<Vec<u8>> {
        let sealed = EncryptedBundle::load(self.storage, bundle).await?;
        let key = self.custodian().fetch_data_key(data_key).await?;
        let document = self.cipher.decrypt_bundle(key.as_bytes(), &sealed)?;
        debug!(bytes = document.len(), "Decrypted document");
        Ok(document)
    }
}
