//! Plaintext data key

use rand::RngCore;
use secretstash_core::{Error, Result};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Data key size in bytes (256-bit)
pub const DATA_KEY_SIZE: usize = 32;

/// Plaintext data key. Lives only for the duration of a run and is wiped
/// from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DataKey {
    bytes: [u8; DATA_KEY_SIZE],
}

impl DataKey {
    /// Copy key material, rejecting anything that is not exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; DATA_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::invalid_key(DATA_KEY_SIZE, bytes.len()))?;
        Ok(Self { bytes })
    }

    /// Fresh random key, for tests and local tooling
    pub fn random() -> Self {
        let mut bytes = [0u8; DATA_KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey([REDACTED])")
    }
}
