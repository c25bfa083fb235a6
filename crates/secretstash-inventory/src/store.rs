//! Seams over the parameter and secret services

use async_trait::async_trait;
use secretstash_core::Result;

use crate::entry::{ParameterEntry, SecretListing};

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` or empty means the listing is done
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// The token to pass for the next page, if there is one
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// SSM Parameter Store
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// One page of parameter names
    async fn describe_parameters(&self, next_token: Option<&str>) -> Result<Page<String>>;

    /// Fetch up to 10 parameters. Unknown names are left out of the result;
    /// `kms_key` is never filled in here.
    async fn get_parameters(
        &self,
        names: &[String],
        with_decryption: bool,
    ) -> Result<Vec<ParameterEntry>>;

    /// Fetch one parameter, `None` if it does not exist
    async fn get_parameter(&self, name: &str, with_decryption: bool)
        -> Result<Option<ParameterEntry>>;

    /// Overwrite the value of an existing parameter, keeping its type
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()>;
}

/// Secrets Manager
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// One page of the secret catalog, optionally filtered by name prefix
    async fn list_secrets(
        &self,
        name_prefix: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<Page<SecretListing>>;

    /// Catalog metadata for one secret
    async fn describe_secret(&self, secret_id: &str) -> Result<SecretListing>;

    /// Current string value. `None` when the secret only holds binary data.
    async fn get_secret_value(&self, secret_id: &str) -> Result<Option<String>>;

    async fn put_secret_value(&self, secret_id: &str, value: &str) -> Result<()>;
}
