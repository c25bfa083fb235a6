//! Loading of secretstash.yaml

use crate::error::{Error, Result};
use crate::types::{EncryptionSettings, RestoreSettings, StorageSettings};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// File names searched for in the working directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["secretstash.yaml", "secretstash.yml"];

/// Contents of a secretstash.yaml file.
///
/// Every field is optional; command-line flags take precedence over values
/// read here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StashConfig {
    /// Region of the current account (source of backups, destination of restores)
    #[serde(default)]
    pub region: Option<String>,

    /// Region holding bundles and wrapped data keys during backup
    #[serde(default)]
    pub target_region: Option<String>,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub encryption: EncryptionSettings,

    #[serde(default)]
    pub restore: RestoreSettings,
}

impl StashConfig {
    /// Load configuration from an explicit path, or search the working
    /// directory. A missing file during the search yields the defaults; a
    /// missing explicit path is an error.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let cwd = std::env::current_dir()?;
                let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
                    Error::invalid_config(format!("working directory is not UTF-8: {}", e))
                })?;
                match Self::discover(&cwd) {
                    Some(found) => Self::from_file(&found),
                    None => {
                        debug!("No secretstash.yaml found, using defaults");
                        Ok(Self::default())
                    }
                }
            }
        }
    }

    /// Parse a configuration file
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!(path = %path, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// First config file present in `dir`
    pub fn discover(dir: &Utf8Path) -> Option<Utf8PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }
}
