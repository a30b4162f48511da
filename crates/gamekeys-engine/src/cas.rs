//! Optimistic read-modify-write over a single ledger document.

use gamekeys_core::{Result, ShopError};
use gamekeys_store::{Document, Ledger};

/// What a mutation decided to do with the document.
pub(crate) enum Change<T> {
    /// Commit the mutated document and return the value.
    Write(T),
    /// Leave the stored document alone and return the value.
    Skip(T),
}

/// Load, mutate and conditionally commit a document, restarting from a
/// fresh read whenever another writer committed in between.
///
/// `mutate` sees a fresh copy on every attempt, so it must derive everything
/// from the document it is given. Errors from `mutate` end the loop.
pub(crate) fn read_modify_write<D, T, F>(
    ledger: &Ledger<D>,
    max_attempts: u32,
    mut mutate: F,
) -> Result<T>
where
    D: Document,
    F: FnMut(&mut D) -> Result<Change<T>>,
{
    for attempt in 1..=max_attempts {
        let mut snapshot = ledger.load()?;

        let value = match mutate(&mut snapshot.data)? {
            Change::Skip(value) => return Ok(value),
            Change::Write(value) => value,
        };

        match ledger.commit(snapshot.version, &snapshot.data) {
            Ok(_) => return Ok(value),
            Err(e) if e.is_conflict() => {
                tracing::debug!(document = D::NAME, attempt, "Retrying after version conflict");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(document = D::NAME, max_attempts, "Giving up after repeated conflicts");
    Err(ShopError::Contention {
        attempts: max_attempts,
    })
}
