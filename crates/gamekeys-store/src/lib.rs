//! Versioned document storage for GameKeys.
//!
//! The storefront persists two JSON documents, the inventory and the
//! accounts. Several independent contexts (processes, threads, windows) may
//! share one store, each holding its own snapshot, so every write is a
//! compare-and-swap against the version the writer read.
//!
//! # Architecture
//!
//! - [`DocumentStore`]: named documents with a monotonically increasing
//!   version stamp. Version `0` means "absent".
//! - [`MemoryStore`]: process-local backend used by tests and embedders.
//! - `RocksStore`: `RocksDB` backend (feature `rocksdb-backend`), one
//!   `documents` column family holding CBOR envelopes.
//! - [`Ledger`]: typed view of one document (`InventoryLedger`,
//!   `AccountLedger`).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gamekeys_core::{Account, UserId};
//! use gamekeys_store::{AccountLedger, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let ledger = AccountLedger::new(store);
//!
//! let mut snapshot = ledger.load().unwrap();
//! let user_id = UserId::new("demo@example.com").unwrap();
//! snapshot.data.put(Account::new(user_id.clone(), "Demo", 1000));
//! ledger.commit(snapshot.version, &snapshot.data).unwrap();
//!
//! assert_eq!(ledger.load().unwrap().data.get(&user_id).unwrap().balance, 1000);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ledger;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use ledger::{AccountLedger, Document, InventoryLedger, Ledger, Snapshot};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

/// A document body together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    /// Version stamp; starts at 1 and increments on every write.
    pub version: u64,

    /// The structured body.
    pub body: serde_json::Value,
}

/// Durable named-document storage with optimistic concurrency.
///
/// Implementations must make `write` atomic with respect to every other
/// `write` on the same store: the version check and the update happen as one
/// step.
pub trait DocumentStore: Send + Sync {
    /// Read a document.
    ///
    /// Returns `Ok(None)` if the document was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or decoding fails.
    fn read(&self, name: &str) -> Result<Option<VersionedDocument>>;

    /// Write a document if its stored version still equals `expected_version`.
    ///
    /// Pass `0` to create a document that must not exist yet. Returns the new
    /// version.
    ///
    /// # Errors
    ///
    /// - `StoreError::VersionConflict` if another writer got there first.
    /// - `StoreError::QuotaExceeded` if the encoded body is too large.
    /// - `StoreError::Database` / `StoreError::Serialization` on backend failure.
    fn write(&self, name: &str, body: &serde_json::Value, expected_version: u64) -> Result<u64>;
}

/// Encode a body as JSON text, enforcing an optional byte quota.
pub(crate) fn encode_body(
    name: &str,
    body: &serde_json::Value,
    quota: Option<usize>,
) -> Result<String> {
    let text =
        serde_json::to_string(body).map_err(|e| StoreError::Serialization(e.to_string()))?;

    if let Some(quota) = quota {
        if text.len() > quota {
            return Err(StoreError::QuotaExceeded {
                name: name.to_string(),
                size: text.len(),
                quota,
            });
        }
    }

    Ok(text)
}

/// Decode a JSON body.
pub(crate) fn decode_body(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Fail with a conflict unless `actual == expected`.
pub(crate) fn check_version(name: &str, expected: u64, actual: u64) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        tracing::debug!(document = name, expected, actual, "Version conflict");
        Err(StoreError::VersionConflict {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}
