//! # secretstash-core
//!
//! Shared foundation for the secretstash workspace:
//! - Error taxonomy used by every library crate
//! - Configuration file types and loading (secretstash.yaml)
//! - Policy-driven retry engine used for restore writes

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::StashConfig;
pub use error::{Error, Result};
