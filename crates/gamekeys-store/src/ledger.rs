//! Typed ledgers over named documents.
//!
//! A ledger loads a document into a [`Snapshot`] and commits a modified copy
//! back conditioned on the snapshot's version.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use gamekeys_core::{Accounts, Inventory};

use crate::error::{Result, StoreError};
use crate::schema::doc;
use crate::DocumentStore;

/// A structured document persisted under a fixed name.
pub trait Document: Serialize + DeserializeOwned + Default {
    /// The document name in the store.
    const NAME: &'static str;
}

impl Document for Inventory {
    const NAME: &'static str = doc::INVENTORY;
}

impl Document for Accounts {
    const NAME: &'static str = doc::ACCOUNTS;
}

/// A document value and the version it was read at.
///
/// An absent document loads as `T::default()` at version `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    /// Version the data was read at.
    pub version: u64,

    /// The decoded document.
    pub data: T,
}

/// Typed access to one document.
pub struct Ledger<T> {
    store: Arc<dyn DocumentStore>,
    _document: PhantomData<fn() -> T>,
}

/// Ledger of unsold keys per game.
pub type InventoryLedger = Ledger<Inventory>;

/// Ledger of user accounts.
pub type AccountLedger = Ledger<Accounts>;

impl<T: Document> Ledger<T> {
    /// Create a ledger over a store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _document: PhantomData,
        }
    }

    /// Read the current document.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the body does not decode as `T`.
    pub fn load(&self) -> Result<Snapshot<T>> {
        match self.store.read(T::NAME)? {
            Some(document) => Ok(Snapshot {
                version: document.version,
                data: serde_json::from_value(document.body)
                    .map_err(|e| StoreError::Serialization(format!("{}: {e}", T::NAME)))?,
            }),
            None => Ok(Snapshot {
                version: 0,
                data: T::default(),
            }),
        }
    }

    /// Write `data` if the stored document is still at `version`.
    ///
    /// Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VersionConflict` if another writer committed since
    /// `version` was read, or any backend failure.
    pub fn commit(&self, version: u64, data: &T) -> Result<u64> {
        let body =
            serde_json::to_value(data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.write(T::NAME, &body, version)
    }

    /// Write `initial` only if the document does not exist yet.
    ///
    /// When another context seeded first, its document wins and is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn seed(&self, initial: T) -> Result<Snapshot<T>> {
        let existing = self.load()?;
        if existing.version > 0 {
            return Ok(existing);
        }

        match self.commit(0, &initial) {
            Ok(version) => {
                tracing::info!(document = T::NAME, version, "Seeded document");
                Ok(Snapshot {
                    version,
                    data: initial,
                })
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(document = T::NAME, "Document seeded concurrently");
                self.load()
            }
            Err(e) => Err(e),
        }
    }
}

impl<T> Clone for Ledger<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _document: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Ledger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("document", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
