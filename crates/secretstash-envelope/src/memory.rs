//! In-memory stand-ins for S3 and KMS
//!
//! Used by the test suites of every crate in the workspace. Each store
//! records the calls it receives so tests can assert on them.

use async_trait::async_trait;
use rand::RngCore;
use secretstash_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::key::DataKey;
use crate::kms::{GeneratedDataKey, KeyService};
use crate::storage::{ObjectLocation, ObjectStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Object store backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<ObjectLocation, Vec<u8>>>,
    tags: Mutex<HashMap<ObjectLocation, Vec<(String, String)>>>,
    puts: Mutex<Vec<ObjectLocation>>,
    failing: Mutex<HashSet<ObjectLocation>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a put
    pub fn insert(&self, location: &ObjectLocation, body: Vec<u8>) {
        lock(&self.objects).insert(location.clone(), body);
    }

    pub fn object(&self, location: &ObjectLocation) -> Option<Vec<u8>> {
        lock(&self.objects).get(location).cloned()
    }

    pub fn tags(&self, location: &ObjectLocation) -> Vec<(String, String)> {
        lock(&self.tags).get(location).cloned().unwrap_or_default()
    }

    /// Every successful put, in call order
    pub fn put_log(&self) -> Vec<ObjectLocation> {
        lock(&self.puts).clone()
    }

    /// Make every put to `location` fail with a transport error
    pub fn fail_puts_to(&self, location: &ObjectLocation) {
        lock(&self.failing).insert(location.clone());
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        self.object(location)
            .ok_or_else(|| Error::object_not_found(&location.bucket, &location.key))
    }

    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Vec<u8>,
        tags: &[(String, String)],
    ) -> Result<()> {
        if lock(&self.failing).contains(location) {
            return Err(Error::transport(
                format!("s3:PutObject {}", location),
                "simulated failure",
            ));
        }
        lock(&self.objects).insert(location.clone(), body);
        lock(&self.tags).insert(location.clone(), tags.to_vec());
        lock(&self.puts).push(location.clone());
        Ok(())
    }
}

/// Key service that "wraps" keys by handing out random handles.
///
/// Only handles it issued (or that were seeded) can be unwrapped.
#[derive(Debug, Default)]
pub struct MemoryKeyService {
    wrapped: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    decrypt_calls: AtomicU32,
    generate_calls: AtomicU32,
}

impl MemoryKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plaintext` under a new wrapped handle and return the handle
    pub fn wrap(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut handle = vec![0u8; 48];
        rand::rng().fill_bytes(&mut handle);
        lock(&self.wrapped).insert(handle.clone(), plaintext.to_vec());
        handle
    }

    pub fn decrypt_calls(&self) -> u32 {
        self.decrypt_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyService for MemoryKeyService {
    async fn generate_data_key(&self, master_key_id: &str) -> Result<GeneratedDataKey> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let plaintext = DataKey::random();
        let wrapped = self.wrap(plaintext.as_bytes());
        Ok(GeneratedDataKey {
            key_id: format!("arn:aws:kms:us-east-1:000000000000:key/{}", master_key_id),
            wrapped,
            plaintext,
        })
    }

    async fn decrypt(&self, wrapped: &[u8]) -> Result<DataKey> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        let plaintext = lock(&self.wrapped).get(wrapped).cloned().ok_or_else(|| {
            Error::transport("kms:Decrypt", "InvalidCiphertextException")
        })?;
        DataKey::from_slice(&plaintext)
    }
}
