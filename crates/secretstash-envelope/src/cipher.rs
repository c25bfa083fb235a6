//! AEAD encryption of whole payloads
//!
//! Every call draws a fresh random 12-byte nonce. No associated data is
//! bound in, so the ciphertext, nonce and key are all that is needed to
//! decrypt.

use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use secretstash_core::types::EncryptionAlgorithm;
use secretstash_core::{Error, Result};

use crate::bundle::EncryptedBundle;
use crate::key::DATA_KEY_SIZE;

/// Nonce size in bytes for both supported algorithms
pub const NONCE_SIZE: usize = 12;

/// Encrypts and decrypts payloads with a raw 256-bit key
#[derive(Debug, Clone, Copy, Default)]
pub struct Cipher {
    algorithm: EncryptionAlgorithm,
}

impl Cipher {
    pub fn new(algorithm: EncryptionAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    /// Encrypt `plaintext` under `key` with a freshly generated nonce
    pub fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<EncryptedBundle> {
        check_key(key)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = match self.algorithm {
            EncryptionAlgorithm::Aes256Gcm => seal::<Aes256Gcm>(key, &nonce, plaintext)?,
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                seal::<ChaCha20Poly1305>(key, &nonce, plaintext)?
            }
        };

        Ok(EncryptedBundle {
            ciphertext,
            nonce: nonce.to_vec(),
        })
    }

    /// Decrypt and authenticate. Any mismatch between key, nonce and
    /// ciphertext yields `Error::Authentication` and no plaintext.
    pub fn decrypt(&self, key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        check_key(key)?;
        if nonce.len() != NONCE_SIZE {
            return Err(Error::invalid_nonce(NONCE_SIZE, nonce.len()));
        }

        match self.algorithm {
            EncryptionAlgorithm::Aes256Gcm => open::<Aes256Gcm>(key, nonce, ciphertext),
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                open::<ChaCha20Poly1305>(key, nonce, ciphertext)
            }
        }
    }

    /// Decrypt a bundle read from storage
    pub fn decrypt_bundle(&self, key: &[u8], bundle: &EncryptedBundle) -> Result<Vec<u8>> {
        self.decrypt(key, &bundle.nonce, &bundle.ciphertext)
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() != DATA_KEY_SIZE {
        return Err(Error::invalid_key(DATA_KEY_SIZE, key.len()));
    }
    Ok(())
}

fn seal<C: Aead + KeyInit>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        C::new_from_slice(key).map_err(|_| Error::invalid_key(DATA_KEY_SIZE, key.len()))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|e| Error::Encryption(e.to_string()))
}

fn open<C: Aead + KeyInit>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        C::new_from_slice(key).map_err(|_| Error::invalid_key(DATA_KEY_SIZE, key.len()))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| Error::Authentication)
}
