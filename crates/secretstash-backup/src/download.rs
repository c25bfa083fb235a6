//! Download runs

use secretstash_core::Result;
use secretstash_envelope::ObjectLocation;
use tracing::info;

use crate::sealed::SealedStore;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub bundle: ObjectLocation,
    pub data_key: ObjectLocation,
}

/// Decrypts a bundle without interpreting it
pub struct DownloadRunner<'a> {
    sealed: SealedStore<'a>,
}

impl<'a> DownloadRunner<'a> {
    pub fn new(sealed: SealedStore<'a>) -> Self {
        Self { sealed }
    }

    /// The exact bytes that were encrypted at backup time
    pub async fn run(&self, options: &DownloadOptions) -> Result<Vec<u8>> {
        info!(location = %options.bundle, "Downloading backup");
        self.sealed.open(&options.bundle, &options.data_key).await
    }
}
