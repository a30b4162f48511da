//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `DocumentStore`
//! trait. Each document is one CBOR envelope in the `documents` column family.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
    WriteOptions,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::schema::{all_column_families, cf};
use crate::{check_version, decode_body, encode_body, DocumentStore, VersionedDocument};

/// On-disk form of a document.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u64,
    body: String,
}

/// RocksDB-backed storage implementation.
///
/// `RocksDB` holds an exclusive lock on its directory, so every context
/// sharing the data goes through one `RocksStore`. The commit lock makes the
/// version check and the put a single step for all of them.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    commit_lock: Mutex<()>,
    quota: Option<usize>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Mutex::new(()),
            quota: None,
        })
    }

    /// Reject documents whose encoded body exceeds `quota` bytes.
    #[must_use]
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn envelope(&self, name: &str) -> Result<Option<Envelope>> {
        let cf = self.cf(cf::DOCUMENTS)?;

        self.db
            .get_cf(&cf, name.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

impl DocumentStore for RocksStore {
    fn read(&self, name: &str) -> Result<Option<VersionedDocument>> {
        self.envelope(name)?
            .map(|envelope| {
                Ok(VersionedDocument {
                    version: envelope.version,
                    body: decode_body(&envelope.body)?,
                })
            })
            .transpose()
    }

    fn write(&self, name: &str, body: &serde_json::Value, expected_version: u64) -> Result<u64> {
        let body = encode_body(name, body, self.quota)?;

        let _guard = self
            .commit_lock
            .lock()
            .map_err(|_| StoreError::Database("commit lock poisoned".into()))?;

        let actual = self.envelope(name)?.map_or(0, |e| e.version);
        check_version(name, expected_version, actual)?;

        let version = actual + 1;
        let value = Self::serialize(&Envelope { version, body })?;

        let cf = self.cf(cf::DOCUMENTS)?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);

        self.db
            .put_cf_opt(&cf, name.as_bytes(), value, &write_opts)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(version)
    }
}
