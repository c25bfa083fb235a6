//! Object storage abstraction

use async_trait::async_trait;
use secretstash_core::Result;
use std::fmt;

/// A `bucket/key` address in object storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Same bucket, `suffix` appended to the key
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            bucket: self.bucket.clone(),
            key: format!("{}{}", self.key, suffix),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Byte-object GET/PUT.
///
/// `get_object` fails with `Error::ObjectNotFound` when the object is absent
/// and `Error::Transport` for every other failure.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>>;

    /// Store `body`, replacing any existing object. `tags` become object tags.
    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Vec<u8>,
        tags: &[(String, String)],
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_keeps_bucket() {
        let loc = ObjectLocation::new("backups", "prod/params.json");
        let nonce = loc.with_suffix(".nonce");
        assert_eq!(nonce.bucket, "backups");
        assert_eq!(nonce.key, "prod/params.json.nonce");
        assert_eq!(nonce.to_string(), "s3://backups/prod/params.json.nonce");
    }
}
