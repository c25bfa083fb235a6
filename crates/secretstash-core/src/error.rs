//! Error types for secretstash-core

use thiserror::Error;

/// Result type alias using secretstash's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised across backup, download and restore runs.
///
/// `NotFound` and `PolicyViolation` are the only variants a restore run
/// recovers from; every other variant aborts the run.
#[derive(Error, Debug)]
pub enum Error {
    /// A cloud API call failed (network, permissions, throttling, bad request)
    #[error("{operation} failed: {message}")]
    Transport { operation: String, message: String },

    /// A storage object that must exist is missing
    #[error("Object not found: s3://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// Ciphertext, nonce and key failed integrity verification
    #[error("Decryption failed: ciphertext could not be authenticated (wrong key, wrong nonce, or corrupted data)")]
    Authentication,

    /// The cipher refused to seal a payload
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Key material has the wrong length or format
    #[error("Invalid data key: expected {expected} bytes, got {actual}")]
    InvalidKey { expected: usize, actual: usize },

    /// Nonce has the wrong length for the cipher
    #[error("Invalid nonce: expected {expected} bytes, got {actual}")]
    InvalidNonce { expected: usize, actual: usize },

    /// Restore target does not exist in the destination account
    #[error("No {kind} matching '{name}' in the destination")]
    NotFound { kind: String, name: String },

    /// Restore target holds a live value instead of the placeholder
    #[error("{name}: {reason}")]
    PolicyViolation { name: String, reason: String },

    /// Every write attempt failed
    #[error("Writing {target} failed after {attempts} attempts: {message}")]
    RetryExhausted {
        target: String,
        attempts: u32,
        message: String,
    },

    /// Source entry carries a value this tool cannot back up
    #[error("Cannot back up {name}: {reason}")]
    UnsupportedValue { name: String, reason: String },

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Missing or contradictory configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a transport error from any displayable cause
    pub fn transport(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: cause.to_string(),
        }
    }

    /// Create an object not found error
    pub fn object_not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create an invalid key error
    pub fn invalid_key(expected: usize, actual: usize) -> Self {
        Self::InvalidKey { expected, actual }
    }

    /// Create an invalid nonce error
    pub fn invalid_nonce(expected: usize, actual: usize) -> Self {
        Self::InvalidNonce { expected, actual }
    }

    /// Create a restore-target not found error
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a policy violation error
    pub fn policy_violation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PolicyViolation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported value error
    pub fn unsupported_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether a restore run may log this error and move on to the next entry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::PolicyViolation { .. })
    }
}
