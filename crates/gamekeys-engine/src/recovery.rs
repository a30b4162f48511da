//! Resolution of pending issues left behind by interrupted purchases.
//!
//! A purchase journals its key as pending in the same write that removes it
//! from stock. If the context dies before the account commit or before the
//! journal entry is settled, the entry stays behind. Recovery decides its
//! fate from the accounts document: a key recorded in some purchase history
//! is settled, any other key goes back to the front of its queue.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use gamekeys_core::{Accounts, Inventory, Result};
use gamekeys_store::{AccountLedger, InventoryLedger};

use crate::cas::{read_modify_write, Change};

/// What happened to one pending key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// The key is in a purchase history; the journal entry was dropped.
    Settled,
    /// The key was not sold; it is back in stock.
    Restored,
    /// The key was not pending.
    NotPending,
}

/// Settle or restore one pending key against the accounts document.
pub(crate) fn resolve_key(inventory: &mut Inventory, accounts: &Accounts, key: &str) -> Resolution {
    if !inventory.is_pending(key) {
        Resolution::NotPending
    } else if accounts.owner_of(key).is_some() {
        inventory.settle(key);
        Resolution::Settled
    } else {
        inventory.restore(key);
        Resolution::Restored
    }
}

/// Keys resolved by a recovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Keys found in a purchase history; their journal entries were dropped.
    pub settled: Vec<String>,

    /// Keys returned to stock.
    pub restored: Vec<String>,
}

impl RecoveryReport {
    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty() && self.restored.is_empty()
    }
}

/// Resolve every pending issue older than `grace`.
///
/// Entries younger than `grace` may belong to a purchase still in flight in
/// another context and are left alone.
///
/// # Errors
///
/// Returns `ShopError::StoreFailure` if the store fails, or
/// `ShopError::Contention` if the inventory keeps changing underneath.
pub fn recover_pending(
    inventory: &InventoryLedger,
    accounts: &AccountLedger,
    grace: Duration,
    max_attempts: u32,
) -> Result<RecoveryReport> {
    let grace =
        chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::days(36_500));

    let report = read_modify_write(inventory, max_attempts, |doc| {
        let cutoff = Utc::now() - grace;
        let stale: Vec<String> = doc
            .pending()
            .iter()
            .filter(|p| p.reserved_at <= cutoff)
            .map(|p| p.key.clone())
            .collect();

        if stale.is_empty() {
            return Ok(Change::Skip(RecoveryReport::default()));
        }

        let owners = accounts.load()?.data;
        let mut report = RecoveryReport::default();
        for key in stale {
            match resolve_key(doc, &owners, &key) {
                Resolution::Settled => report.settled.push(key),
                Resolution::Restored => report.restored.push(key),
                Resolution::NotPending => {}
            }
        }
        Ok(Change::Write(report))
    })?;

    if !report.is_empty() {
        tracing::info!(
            settled = report.settled.len(),
            restored = report.restored.len(),
            "Resolved pending key issues"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamekeys_core::{apply_delta, Account, Catalog, Game, GameId, PurchaseRecord, UserId};
    use std::collections::BTreeMap;

    fn game() -> Game {
        serde_json::from_value(serde_json::json!({
            "id": 1, "title": "Hades", "price": 100, "discountPercent": 0
        }))
        .unwrap()
    }

    fn stocked(keys: &[&str]) -> Inventory {
        let mut stock = BTreeMap::new();
        stock.insert(GameId::new("1").unwrap(), keys.iter().map(ToString::to_string).collect());
        Inventory::from_stock(stock).unwrap()
    }

    #[test]
    fn resolve_settles_sold_keys_and_restores_others() {
        let buyer = UserId::new("a@b.c").unwrap();
        let game_id = GameId::new("1").unwrap();
        let catalog = Catalog::new(vec![game()]).unwrap();
        let game = catalog.get(&game_id).unwrap();

        let mut inventory = stocked(&["KEY-A", "KEY-B", "KEY-C"]);
        let sold = inventory.take_one(&game_id, &buyer).unwrap();
        let unsold = inventory.take_one(&game_id, &buyer).unwrap();

        let account = Account::new(buyer.clone(), "Ann", 1000);
        let account =
            apply_delta(&account, -100, Some(PurchaseRecord::new(game, sold.clone()))).unwrap();
        let accounts: Accounts = [account].into_iter().collect();

        assert_eq!(resolve_key(&mut inventory, &accounts, &sold), Resolution::Settled);
        assert_eq!(resolve_key(&mut inventory, &accounts, &unsold), Resolution::Restored);
        assert_eq!(resolve_key(&mut inventory, &accounts, &unsold), Resolution::NotPending);

        assert!(inventory.pending().is_empty());
        assert_eq!(inventory.keys(&game_id).collect::<Vec<_>>(), ["KEY-B", "KEY-C"]);
    }
}
