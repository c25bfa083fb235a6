//! # secretstash-envelope
//!
//! Envelope encryption for backup bundles. A data key generated by KMS
//! encrypts the backup document; only the KMS-wrapped form of that key is
//! ever stored.
//!
//! - [`Cipher`]: AEAD encryption of a whole payload under a raw key
//! - [`DataKey`]: plaintext key material, zeroized on drop
//! - [`KeyCustodian`]: generates, stores and unwraps data keys
//! - [`EncryptedBundle`]: ciphertext + nonce stored as `<key>` and `<key>.nonce`
//! - [`ObjectStore`] / [`KeyService`]: seams over S3 and KMS

pub mod bundle;
pub mod cipher;
pub mod custodian;
pub mod key;
pub mod kms;
pub mod memory;
pub mod s3;
pub mod storage;

pub use bundle::{EncryptedBundle, NONCE_SUFFIX};
pub use cipher::{Cipher, NONCE_SIZE};
pub use custodian::{KeyCustodian, KEY_ID_TAG};
pub use key::{DataKey, DATA_KEY_SIZE};
pub use kms::{GeneratedDataKey, KeyService, KmsKeyService};
pub use memory::{MemoryKeyService, MemoryObjectStore};
pub use s3::S3ObjectStore;
pub use storage::{ObjectLocation, ObjectStore};
