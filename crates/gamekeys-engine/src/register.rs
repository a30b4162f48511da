//! Account registration.

use gamekeys_core::{Account, Result, ShopError, UserId};
use gamekeys_store::AccountLedger;

use crate::cas::{read_modify_write, Change};

/// Creates accounts holding the starting grant.
#[derive(Debug, Clone)]
pub struct Registrar {
    accounts: AccountLedger,
    starting_balance: i64,
    max_attempts: u32,
}

impl Registrar {
    /// Create a registrar granting `starting_balance` to new accounts.
    #[must_use]
    pub fn new(accounts: AccountLedger, starting_balance: i64, max_attempts: u32) -> Self {
        Self {
            accounts,
            starting_balance,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Register a new account under the normalized e-mail address.
    ///
    /// # Errors
    ///
    /// - `ShopError::InvalidId` if the address is blank.
    /// - `ShopError::AccountExists` if the address is already registered.
    /// - `ShopError::Contention` / `ShopError::StoreFailure` from the store.
    pub fn register(&self, email: &str, display_name: &str) -> Result<Account> {
        let user_id = UserId::new(email)?;

        let account = read_modify_write(&self.accounts, self.max_attempts, |accounts| {
            if accounts.contains(&user_id) {
                return Err(ShopError::AccountExists {
                    user_id: user_id.to_string(),
                });
            }
            let account =
                Account::new(user_id.clone(), display_name.trim(), self.starting_balance);
            accounts.put(account.clone());
            Ok(Change::Write(account))
        })?;

        tracing::info!(user_id = %account.user_id, balance = account.balance, "Account registered");

        Ok(account)
    }
}
