//! In-memory parameter and secret stores
//!
//! Both keep entries in insertion order, page their listings, and record
//! the calls they receive. Writes can be made to fail a set number of
//! times to exercise retry handling.

use async_trait::async_trait;
use secretstash_core::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::entry::{ParameterEntry, SecretListing};
use crate::store::{Page, ParameterStore, SecretStore};

const DEFAULT_PAGE_SIZE: usize = 50;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn page_of<T: Clone>(items: &[T], page_size: usize, next_token: Option<&str>) -> Result<Page<T>> {
    let start = match next_token {
        Some(token) => token
            .parse::<usize>()
            .map_err(|_| Error::transport("list", format!("invalid next token '{}'", token)))?,
        None => 0,
    };
    let end = (start + page_size).min(items.len());
    Ok(Page {
        items: items.get(start..end).unwrap_or_default().to_vec(),
        next_token: (end < items.len()).then(|| end.to_string()),
    })
}

/// Counts down injected write failures
#[derive(Debug, Default)]
struct FailureBudget(AtomicU32);

impl FailureBudget {
    fn set(&self, count: u32) {
        self.0.store(count, Ordering::SeqCst);
    }

    /// True while failures remain, consuming one
    fn take(&self) -> bool {
        self.0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

/// Parameter store held in memory.
///
/// Non-decrypting reads of a `SecureString` return a stand-in for the KMS
/// ciphertext (see [`MemoryParameterStore::raw_value_of`]).
#[derive(Debug)]
pub struct MemoryParameterStore {
    parameters: Mutex<Vec<ParameterEntry>>,
    page_size: usize,
    reverse_raw: bool,
    omit_raw: Vec<String>,
    omit_decrypted: Vec<String>,
    describe_calls: AtomicU32,
    get_parameters_calls: Mutex<Vec<(Vec<String>, bool)>>,
    puts: Mutex<Vec<(String, String)>>,
    put_attempts: AtomicU32,
    put_failures: FailureBudget,
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self {
            parameters: Mutex::new(Vec::new()),
            page_size: DEFAULT_PAGE_SIZE,
            reverse_raw: false,
            omit_raw: Vec::new(),
            omit_decrypted: Vec::new(),
            describe_calls: AtomicU32::new(0),
            get_parameters_calls: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
            put_attempts: AtomicU32::new(0),
            put_failures: FailureBudget::default(),
        }
    }
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Return non-decrypting batch results in reverse order
    pub fn with_reversed_raw_responses(mut self) -> Self {
        self.reverse_raw = true;
        self
    }

    /// Leave `name` out of non-decrypting batch results
    pub fn omit_from_raw(mut self, name: &str) -> Self {
        self.omit_raw.push(name.to_string());
        self
    }

    /// Leave `name` out of decrypting batch results
    pub fn omit_from_decrypted(mut self, name: &str) -> Self {
        self.omit_decrypted.push(name.to_string());
        self
    }

    /// What a non-decrypting read returns for a SecureString named `name`
    pub fn raw_value_of(name: &str) -> String {
        format!("kms-ciphertext:{}", name)
    }

    pub fn insert(&self, name: &str, parameter_type: &str, value: &str) {
        let mut parameters = lock(&self.parameters);
        parameters.retain(|p| p.name != name);
        parameters.push(ParameterEntry {
            arn: Some(format!(
                "arn:aws:ssm:us-east-1:000000000000:parameter{}",
                name
            )),
            data_type: Some("text".to_string()),
            name: name.to_string(),
            r#type: parameter_type.to_string(),
            value: value.to_string(),
            version: 1,
            ..Default::default()
        });
    }

    /// Current (decrypted) value of `name`
    pub fn value(&self, name: &str) -> Option<String> {
        lock(&self.parameters)
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.clone())
    }

    /// Fail the next `count` puts with a transport error
    pub fn fail_next_puts(&self, count: u32) {
        self.put_failures.set(count);
    }

    pub fn describe_calls(&self) -> u32 {
        self.describe_calls.load(Ordering::SeqCst)
    }

    /// `(names, with_decryption)` for every GetParameters call
    pub fn get_parameters_calls(&self) -> Vec<(Vec<String>, bool)> {
        lock(&self.get_parameters_calls).clone()
    }

    /// Successful writes as `(name, value)`
    pub fn puts(&self) -> Vec<(String, String)> {
        lock(&self.puts).clone()
    }

    /// Every put call, including failed ones
    pub fn put_attempts(&self) -> u32 {
        self.put_attempts.load(Ordering::SeqCst)
    }

    fn read(&self, parameter: &ParameterEntry, with_decryption: bool) -> ParameterEntry {
        let mut copy = parameter.clone();
        if !with_decryption && parameter.r#type == "SecureString" {
            copy.value = Self::raw_value_of(&parameter.name);
        }
        copy
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn describe_parameters(&self, next_token: Option<&str>) -> Result<Page<String>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let names: Vec<String> = lock(&self.parameters).iter().map(|p| p.name.clone()).collect();
        page_of(&names, self.page_size, next_token)
    }

    async fn get_parameters(
        &self,
        names: &[String],
        with_decryption: bool,
    ) -> Result<Vec<ParameterEntry>> {
        if names.len() > 10 {
            return Err(Error::transport(
                "ssm:GetParameters",
                "ValidationException: at most 10 names per call",
            ));
        }
        lock(&self.get_parameters_calls).push((names.to_vec(), with_decryption));

        let omitted = if with_decryption {
            &self.omit_decrypted
        } else {
            &self.omit_raw
        };
        let parameters = lock(&self.parameters);
        let mut found: Vec<ParameterEntry> = names
            .iter()
            .filter(|name| !omitted.contains(name))
            .filter_map(|name| parameters.iter().find(|p| &p.name == name))
            .map(|p| self.read(p, with_decryption))
            .collect();
        if self.reverse_raw && !with_decryption {
            found.reverse();
        }
        Ok(found)
    }

    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<ParameterEntry>> {
        Ok(lock(&self.parameters)
            .iter()
            .find(|p| p.name == name)
            .map(|p| self.read(p, with_decryption)))
    }

    async fn put_parameter(&self, name: &str, value: &str) -> Result<()> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.put_failures.take() {
            return Err(Error::transport(
                format!("ssm:PutParameter {}", name),
                "ThrottlingException: Rate exceeded",
            ));
        }

        let mut parameters = lock(&self.parameters);
        let parameter = parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::transport("ssm:PutParameter", "ParameterNotFound"))?;
        parameter.value = value.to_string();
        parameter.version += 1;
        lock(&self.puts).push((name.to_string(), value.to_string()));
        Ok(())
    }
}

/// Secret store held in memory.
///
/// The name-prefix filter matches case-insensitively, like Secrets
/// Manager's `name` filter.
#[derive(Debug)]
pub struct MemorySecretStore {
    secrets: Mutex<Vec<(SecretListing, Option<String>)>>,
    page_size: usize,
    list_calls: AtomicU32,
    puts: Mutex<Vec<(String, String)>>,
    put_attempts: AtomicU32,
    put_failures: FailureBudget,
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self {
            secrets: Mutex::new(Vec::new()),
            page_size: DEFAULT_PAGE_SIZE,
            list_calls: AtomicU32::new(0),
            puts: Mutex::new(Vec::new()),
            put_attempts: AtomicU32::new(0),
            put_failures: FailureBudget::default(),
        }
    }
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// ARN assigned to a secret named `name`
    pub fn arn_of(name: &str) -> String {
        format!(
            "arn:aws:secretsmanager:us-east-1:000000000000:secret:{}-AbCdEf",
            name
        )
    }

    pub fn insert(&self, name: &str, value: &str) {
        self.insert_raw(name, Some(value.to_string()));
    }

    /// A secret with only binary data
    pub fn insert_binary(&self, name: &str) {
        self.insert_raw(name, None);
    }

    fn insert_raw(&self, name: &str, value: Option<String>) {
        let listing = SecretListing {
            arn: Some(Self::arn_of(name)),
            name: Some(name.to_string()),
            description: Some(format!("{} secret", name)),
            ..Default::default()
        };
        let mut secrets = lock(&self.secrets);
        secrets.retain(|(l, _)| l.name() != name);
        secrets.push((listing, value));
    }

    pub fn value(&self, name: &str) -> Option<String> {
        lock(&self.secrets)
            .iter()
            .find(|(l, _)| l.name() == name)
            .and_then(|(_, v)| v.clone())
    }

    pub fn fail_next_puts(&self, count: u32) {
        self.put_failures.set(count);
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Successful writes as `(secret id, value)`
    pub fn puts(&self) -> Vec<(String, String)> {
        lock(&self.puts).clone()
    }

    pub fn put_attempts(&self) -> u32 {
        self.put_attempts.load(Ordering::SeqCst)
    }

    fn find_index(secrets: &[(SecretListing, Option<String>)], secret_id: &str) -> Option<usize> {
        secrets
            .iter()
            .position(|(l, _)| l.arn.as_deref() == Some(secret_id) || l.name() == secret_id)
    }

    fn missing(operation: &str, secret_id: &str) -> Error {
        Error::transport(
            format!("secretsmanager:{} {}", operation, secret_id),
            "ResourceNotFoundException: Secrets Manager can't find the specified secret.",
        )
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn list_secrets(
        &self,
        name_prefix: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<Page<SecretListing>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let prefix = name_prefix.map(str::to_lowercase);
        let matching: Vec<SecretListing> = lock(&self.secrets)
            .iter()
            .map(|(l, _)| l)
            .filter(|l| match &prefix {
                Some(p) => l.name().to_lowercase().starts_with(p.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        page_of(&matching, self.page_size, next_token)
    }

    async fn describe_secret(&self, secret_id: &str) -> Result<SecretListing> {
        let secrets = lock(&self.secrets);
        Self::find_index(&secrets, secret_id)
            .map(|i| secrets[i].0.clone())
            .ok_or_else(|| Self::missing("DescribeSecret", secret_id))
    }

    async fn get_secret_value(&self, secret_id: &str) -> Result<Option<String>> {
        let secrets = lock(&self.secrets);
        Self::find_index(&secrets, secret_id)
            .map(|i| secrets[i].1.clone())
            .ok_or_else(|| Self::missing("GetSecretValue", secret_id))
    }

    async fn put_secret_value(&self, secret_id: &str, value: &str) -> Result<()> {
        self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.put_failures.take() {
            return Err(Error::transport(
                format!("secretsmanager:PutSecretValue {}", secret_id),
                "InternalServiceError",
            ));
        }

        let mut secrets = lock(&self.secrets);
        let index = Self::find_index(&secrets, secret_id)
            .ok_or_else(|| Self::missing("PutSecretValue", secret_id))?;
        secrets[index].1 = Some(value.to_string());
        lock(&self.puts).push((secret_id.to_string(), value.to_string()));
        Ok(())
    }
}
