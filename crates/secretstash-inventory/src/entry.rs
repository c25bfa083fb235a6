//! Backed-up entries
//!
//! Field names are PascalCase so documents written by earlier releases read
//! back unchanged. Absent optional fields serialize as `null`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An SSM parameter as captured at backup time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterEntry {
    #[serde(rename = "ARN", default)]
    pub arn: Option<String>,

    #[serde(default)]
    pub data_type: Option<String>,

    #[serde(default)]
    pub last_modified_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default)]
    pub selector: Option<String>,

    #[serde(default)]
    pub source_result: Option<String>,

    /// `String`, `StringList` or `SecureString`
    #[serde(default, deserialize_with = "null_as_default")]
    pub r#type: String,

    /// Decrypted value
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,

    #[serde(default)]
    pub version: i64,

    /// Value returned by the non-decrypting fetch
    #[serde(default, deserialize_with = "null_as_default")]
    pub kms_key: String,
}

/// A Secrets Manager tag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// Rotation schedule of a secret
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RotationRules {
    #[serde(default)]
    pub automatically_after_days: Option<i64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub schedule_expression: Option<String>,
}

/// Catalog metadata for a secret, as returned by ListSecrets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretListing {
    #[serde(rename = "ARN", default)]
    pub arn: Option<String>,

    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub deleted_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub kms_key_id: Option<String>,

    #[serde(default)]
    pub last_accessed_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_changed_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_rotated_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub next_rotation_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub owning_service: Option<String>,

    #[serde(default)]
    pub primary_region: Option<String>,

    #[serde(default)]
    pub rotation_enabled: Option<bool>,

    #[serde(rename = "RotationLambdaARN", default)]
    pub rotation_lambda_arn: Option<String>,

    #[serde(default)]
    pub rotation_rules: Option<RotationRules>,

    /// Version id to staging labels
    #[serde(default)]
    pub secret_versions_to_stages: Option<BTreeMap<String, Vec<String>>>,

    /// `None` when the service returned no tag list at all
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

impl SecretListing {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// ARN when known, otherwise the name
    pub fn secret_id(&self) -> &str {
        self.arn.as_deref().unwrap_or_else(|| self.name())
    }
}

/// A secret as captured at backup time: catalog metadata plus its value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretEntry {
    #[serde(flatten)]
    pub listing: SecretListing,

    #[serde(rename = "SecretValue", default, deserialize_with = "null_as_default")]
    pub secret_value: String,
}

impl SecretEntry {
    pub fn name(&self) -> &str {
        self.listing.name()
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Convert an AWS timestamp into a chrono one
pub(crate) fn to_utc(secs: i64, nanos: u32) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, nanos)
}
