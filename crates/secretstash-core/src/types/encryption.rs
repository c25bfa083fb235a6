//! Cipher selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AEAD cipher used for backup bundles.
///
/// The choice is not recorded in the bundle, so a restore must use the same
/// algorithm the backup was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionAlgorithm {
    /// AES-256-GCM, the format written by earlier releases
    #[default]
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    /// Every supported cipher, default first
    pub const ALL: [EncryptionAlgorithm; 2] = [Self::Aes256Gcm, Self::ChaCha20Poly1305];

    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionAlgorithm::Aes256Gcm => "aes256gcm",
            EncryptionAlgorithm::ChaCha20Poly1305 => "chacha20poly1305",
        }
    }
}

impl fmt::Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "aes256gcm" => Ok(Self::Aes256Gcm),
            "chacha20poly1305" => Ok(Self::ChaCha20Poly1305),
            other => Err(format!(
                "unknown algorithm '{}' (expected aes256gcm or chacha20poly1305)",
                other
            )),
        }
    }
}
