//! # secretstash-backup
//!
//! Orchestrates the three things secretstash does with a bundle:
//! - backup: enumerate, serialize, encrypt, store
//! - download: fetch, decrypt, hand back the document untouched
//! - restore: fetch, decrypt, and write each entry back behind the
//!   placeholder and dry-run gates

pub mod backup;
pub mod download;
pub mod restore;
pub mod sealed;

pub use backup::{BackupOptions, BackupReceipt, BackupRunner};
pub use download::{DownloadOptions, DownloadRunner};
pub use restore::{
    restore_entries, ParameterRestore, RestoreAction, RestoreOptions, RestoreOutcome,
    RestoreReport, RestoreRunner, RestoreTarget, SecretRestore, TargetRef, PLACEHOLDER,
};
pub use sealed::SealedStore;
