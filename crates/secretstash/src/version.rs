//! Build and cipher information reported by `secretstash version`

use secretstash_core::types::EncryptionAlgorithm;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,

    /// Short commit SHA, suffixed `-dirty` when built from a modified tree
    pub commit: Option<String>,

    pub build_date: Option<String>,

    /// Target triple
    pub target: Option<String>,

    /// Bundle ciphers this binary can seal and open, default first
    pub ciphers: Vec<EncryptionAlgorithm>,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("GIT_SHA").map(String::from),
            build_date: option_env!("BUILD_DATE").map(String::from),
            target: option_env!("TARGET").map(String::from),
            ciphers: EncryptionAlgorithm::ALL.to_vec(),
        }
    }

    /// `aes256gcm (default), chacha20poly1305`
    pub fn cipher_list(&self) -> String {
        let default = EncryptionAlgorithm::default();
        self.ciphers
            .iter()
            .map(|c| {
                if *c == default {
                    format!("{} (default)", c)
                } else {
                    c.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "secretstash {}", self.version)?;
        if let Some(commit) = &self.commit {
            write!(f, " ({})", commit)?;
        }
        if let Some(target) = &self.target {
            write!(f, " {}", target)?;
        }
        Ok(())
    }
}
