//! Type definitions shared across the workspace

mod encryption;
mod retry;
mod settings;

pub use encryption::EncryptionAlgorithm;
pub use retry::{RetryPolicy, RetryStrategy};
pub use settings::{EncryptionSettings, RestoreSettings, StorageSettings};
