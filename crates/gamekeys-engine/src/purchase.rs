//! The purchase transaction engine.
//!
//! A purchase spans two documents. It commits in three version-checked steps:
//!
//! 1. **Take**: the key leaves stock and enters the pending journal, in one
//!    inventory write.
//! 2. **Record**: the account is debited and the purchase record appended, in
//!    one accounts write. A conflict here rolls forward against a fresh read
//!    of the accounts document.
//! 3. **Settle**: the pending entry is dropped.
//!
//! If step 2 cannot complete, the key is compensated back to the front of its
//! queue. If step 2 landed but the store still reported an error, the sale is
//! rolled forward and returned as committed. If compensation itself fails,
//! the key stays pending and [`recover_pending`] resolves it later, so a taken
//! key always ends up either sold or in stock.
//!
//! [`recover_pending`]: crate::recover_pending

use std::sync::Arc;

use serde::Serialize;

use gamekeys_core::{
    apply_delta, Account, Catalog, GameId, PurchaseRecord, Result, ShopError, UserId,
};
use gamekeys_store::{AccountLedger, InventoryLedger};

use crate::cas::{read_modify_write, Change};
use crate::recovery::{resolve_key, Resolution};

/// A committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Purchase {
    /// The buyer's account after the debit.
    pub account: Account,

    /// The issued key.
    pub key: String,

    /// The record appended to the purchase history.
    pub record: PurchaseRecord,
}

/// Outcome of one read-validate-commit attempt.
enum Attempt {
    Committed(Purchase),
    Retry,
}

/// Orchestrates purchases over the inventory and account ledgers.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    inventory: InventoryLedger,
    accounts: AccountLedger,
    catalog: Arc<Catalog>,
    max_attempts: u32,
}

impl TransactionEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(
        inventory: InventoryLedger,
        accounts: AccountLedger,
        catalog: Arc<Catalog>,
        max_attempts: u32,
    ) -> Self {
        Self {
            inventory,
            accounts,
            catalog,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Buy one key of `game_id` for `user_id`.
    ///
    /// Validation order is fixed: unknown user, unknown game, insufficient
    /// funds, out of stock. Nothing is written unless validation passes.
    ///
    /// # Errors
    ///
    /// - `ShopError::UnknownUser`, `ShopError::UnknownGame`,
    ///   `ShopError::InsufficientFunds`, `ShopError::OutOfStock` on validation.
    /// - `ShopError::Contention` when concurrent writers exhaust the retries.
    /// - `ShopError::StoreFailure` when the store fails; any key already taken
    ///   has been returned to stock or left for recovery. A debit that landed
    ///   despite a reported store error is returned as a committed purchase.
    pub fn purchase(&self, user_id: &UserId, game_id: &GameId) -> Result<Purchase> {
        for attempt in 1..=self.max_attempts {
            match self.attempt(user_id, game_id)? {
                Attempt::Committed(purchase) => {
                    tracing::info!(
                        user_id = %user_id,
                        game_id = %game_id,
                        price = purchase.record.price,
                        balance = purchase.account.balance,
                        attempt,
                        "Purchase committed"
                    );
                    return Ok(purchase);
                }
                Attempt::Retry => {
                    tracing::debug!(
                        user_id = %user_id,
                        game_id = %game_id,
                        attempt,
                        "Inventory changed underneath purchase, retrying"
                    );
                }
            }
        }

        tracing::warn!(
            user_id = %user_id,
            game_id = %game_id,
            attempts = self.max_attempts,
            "Purchase gave up under contention"
        );
        Err(ShopError::Contention {
            attempts: self.max_attempts,
        })
    }

    fn attempt(&self, user_id: &UserId, game_id: &GameId) -> Result<Attempt> {
        let accounts = self.accounts.load()?;
        let account = accounts
            .data
            .get(user_id)
            .ok_or_else(|| ShopError::UnknownUser {
                user_id: user_id.to_string(),
            })?;

        let game = self
            .catalog
            .get(game_id)
            .ok_or_else(|| ShopError::UnknownGame {
                game_id: game_id.to_string(),
            })?;

        let price = game.final_price();
        if !account.has_sufficient_funds(price) {
            return Err(ShopError::InsufficientFunds {
                balance: account.balance,
                required: price,
            });
        }

        let mut inventory = self.inventory.load()?;
        if !inventory.data.peek_is_available(game_id) {
            return Err(ShopError::OutOfStock {
                game_id: game_id.to_string(),
            });
        }

        // Take
        let key = inventory.data.take_one(game_id, user_id)?;
        match self.inventory.commit(inventory.version, &inventory.data) {
            Ok(_) => {}
            Err(e) if e.is_conflict() => return Ok(Attempt::Retry),
            Err(e) => return Err(e.into()),
        }

        // Record
        let record = PurchaseRecord::new(game, key.clone());
        let account = match self.record(user_id, &record) {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    game_id = %game_id,
                    key = %key,
                    error = %e,
                    "Account commit failed after key was taken, compensating"
                );
                if self.compensate(&key) != Some(Resolution::Settled) {
                    return Err(e);
                }
                // The debit landed despite the error: the sale stands.
                match self.recorded_account(user_id, &record) {
                    Some(account) => account,
                    None => return Err(e),
                }
            }
        };

        // Settle
        self.settle(&key);

        Ok(Attempt::Committed(Purchase {
            account,
            key,
            record,
        }))
    }

    /// Debit the buyer and append the record, rolling forward on conflicts.
    fn record(&self, user_id: &UserId, record: &PurchaseRecord) -> Result<Account> {
        read_modify_write(&self.accounts, self.max_attempts, |accounts| {
            let current = accounts
                .get(user_id)
                .ok_or_else(|| ShopError::UnknownUser {
                    user_id: user_id.to_string(),
                })?;
            let updated = apply_delta(current, -record.price, Some(record.clone()))?;
            accounts.put(updated.clone());
            Ok(Change::Write(updated))
        })
    }

    /// Drop the pending entry of a sold key.
    ///
    /// Failure only delays cleanup: recovery settles keys found in a purchase
    /// history.
    fn settle(&self, key: &str) {
        let result = read_modify_write(&self.inventory, self.max_attempts, |inventory| {
            Ok(match inventory.settle(key) {
                Some(_) => Change::Write(()),
                None => Change::Skip(()),
            })
        });

        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Deferred settlement of sold key");
        }
    }

    /// Undo a take whose account commit failed.
    ///
    /// The accounts document is consulted first: if the key did reach a
    /// purchase history after all, it is settled rather than restored.
    ///
    /// Returns `None` if compensation itself failed.
    fn compensate(&self, key: &str) -> Option<Resolution> {
        let result = read_modify_write(&self.inventory, self.max_attempts, |inventory| {
            let accounts = self.accounts.load()?.data;
            Ok(match resolve_key(inventory, &accounts, key) {
                Resolution::NotPending => Change::Skip(Resolution::NotPending),
                resolution => Change::Write(resolution),
            })
        });

        match result {
            Ok(resolution) => {
                match resolution {
                    Resolution::Restored => {
                        tracing::info!(key = %key, "Key returned to stock");
                    }
                    Resolution::Settled => {
                        tracing::warn!(
                            key = %key,
                            "Key was recorded despite commit error, settled"
                        );
                    }
                    Resolution::NotPending => {
                        tracing::debug!(key = %key, "Key already resolved elsewhere");
                    }
                }
                Some(resolution)
            }
            Err(e) => {
                tracing::error!(
                    key = %key,
                    error = %e,
                    "Compensation failed; key remains pending until recovery"
                );
                None
            }
        }
    }

    /// The buyer's account if it holds `record`.
    fn recorded_account(&self, user_id: &UserId, record: &PurchaseRecord) -> Option<Account> {
        let accounts = self.accounts.load().ok()?.data;
        accounts
            .get(user_id)
            .filter(|account| account.purchase_history.iter().any(|r| r.id == record.id))
            .cloned()
    }
}
