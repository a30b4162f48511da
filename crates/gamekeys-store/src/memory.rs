//! In-memory storage implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};
use crate::{check_version, decode_body, encode_body, DocumentStore, VersionedDocument};

/// Process-local document store.
///
/// Bodies are kept in their encoded JSON form, so a read returns a fresh
/// value and quota checks see the same sizes a durable backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, (u64, String)>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store with no quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store rejecting documents larger than `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            documents: Mutex::default(),
            quota: Some(quota),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, (u64, String)>>> {
        self.documents
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, name: &str) -> Result<Option<VersionedDocument>> {
        let documents = self.lock()?;
        documents
            .get(name)
            .map(|(version, text)| {
                Ok(VersionedDocument {
                    version: *version,
                    body: decode_body(text)?,
                })
            })
            .transpose()
    }

    fn write(&self, name: &str, body: &serde_json::Value, expected_version: u64) -> Result<u64> {
        let text = encode_body(name, body, self.quota)?;

        let mut documents = self.lock()?;
        let actual = documents.get(name).map_or(0, |(version, _)| *version);
        check_version(name, expected_version, actual)?;

        let version = actual + 1;
        documents.insert(name.to_string(), (version, text));
        Ok(version)
    }
}
