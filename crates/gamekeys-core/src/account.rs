//! Account types for GameKeys.
//!
//! This module defines user accounts, the immutable purchase records they
//! accumulate, and the accounts document persisted by the account ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};
use crate::{Game, GameId, PurchaseId, UserId};

// ============================================================================
// Constants
// ============================================================================

/// Balance granted to every newly registered account.
pub const STARTING_BALANCE: i64 = 1000;

/// A storefront account.
///
/// `balance` only decreases through a purchase debit and only increases
/// through the starting grant or a reward credit. `total_spent` always equals
/// the sum of `purchase_history` prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The normalized e-mail address.
    #[serde(alias = "email")]
    pub user_id: UserId,

    /// Name shown in the profile.
    #[serde(default, alias = "name")]
    pub display_name: String,

    /// Spendable balance in currency units.
    pub balance: i64,

    /// Sum of all purchase prices.
    #[serde(default)]
    pub total_spent: i64,

    /// Purchases in the order they were made.
    #[serde(default, alias = "purchasedGames")]
    pub purchase_history: Vec<PurchaseRecord>,

    /// When the account was registered.
    #[serde(default = "Utc::now", alias = "registrationDate")]
    pub registered_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account holding the given starting grant.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, starting_balance: i64) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            balance: starting_balance,
            total_spent: 0,
            purchase_history: Vec::new(),
            registered_at: Utc::now(),
        }
    }

    /// Check if the balance covers an amount.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount: i64) -> bool {
        self.balance >= amount
    }

    /// Whether the account satisfies its ledger invariants.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let spent: i64 = self.purchase_history.iter().map(|p| p.price).sum();
        self.balance >= 0 && self.total_spent >= 0 && self.total_spent == spent
    }

    /// Whether `key` was issued to this account.
    #[must_use]
    pub fn owns_key(&self, key: &str) -> bool {
        self.purchase_history.iter().any(|p| p.key == key)
    }
}

/// Compute an account after a balance change.
///
/// Appending `record` also adds its price to `total_spent`. The input is never
/// modified.
///
/// # Errors
///
/// - `ShopError::InsufficientFunds` if the resulting balance would be negative.
/// - `ShopError::InvalidAmount` if the arithmetic overflows.
pub fn apply_delta(
    account: &Account,
    balance_delta: i64,
    record: Option<PurchaseRecord>,
) -> Result<Account> {
    let balance = account
        .balance
        .checked_add(balance_delta)
        .ok_or_else(|| ShopError::InvalidAmount(format!("balance overflow: {balance_delta}")))?;

    if balance < 0 {
        return Err(ShopError::InsufficientFunds {
            balance: account.balance,
            required: balance_delta.saturating_neg(),
        });
    }

    let mut next = account.clone();
    next.balance = balance;

    if let Some(record) = record {
        next.total_spent = next
            .total_spent
            .checked_add(record.price)
            .ok_or_else(|| ShopError::InvalidAmount(format!("spend overflow: {}", record.price)))?;
        next.purchase_history.push(record);
    }

    Ok(next)
}

/// An immutable record of one key sold to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Time-ordered record id.
    #[serde(default = "PurchaseId::generate")]
    pub id: PurchaseId,

    /// The game bought.
    pub game_id: GameId,

    /// Title at purchase time.
    pub game_title: String,

    /// The exact key removed from inventory.
    pub key: String,

    /// Final price paid, after discount.
    pub price: i64,

    /// When the purchase was committed.
    #[serde(alias = "purchaseDate")]
    pub purchase_timestamp: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Snapshot a purchase of `game` at its current final price.
    #[must_use]
    pub fn new(game: &Game, key: String) -> Self {
        Self {
            id: PurchaseId::generate(),
            game_id: game.id.clone(),
            game_title: game.title.clone(),
            key,
            price: game.final_price(),
            purchase_timestamp: Utc::now(),
        }
    }
}

/// The accounts document: every account, keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Accounts {
    accounts: BTreeMap<UserId, Account>,
}

impl Accounts {
    /// Get an account by user id.
    #[must_use]
    pub fn get(&self, user_id: &UserId) -> Option<&Account> {
        self.accounts.get(user_id)
    }

    /// Insert or fully replace an account.
    pub fn put(&mut self, account: Account) {
        self.accounts.insert(account.user_id.clone(), account);
    }

    /// Whether an account exists for the user.
    #[must_use]
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.accounts.contains_key(user_id)
    }

    /// Iterate all accounts in user id order.
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether there are no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Iterate `(key, account)` pairs as stored, in user id order.
    ///
    /// The key normally equals `account.user_id`; seed data read from disk
    /// may disagree.
    pub fn entries(&self) -> impl Iterator<Item = (&UserId, &Account)> {
        self.accounts.iter()
    }

    /// Find the account a key was issued to.
    #[must_use]
    pub fn owner_of(&self, key: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.owns_key(key))
    }
}

impl FromIterator<Account> for Accounts {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        let mut accounts = Self::default();
        for account in iter {
            accounts.put(account);
        }
        accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> UserId {
        UserId::new(email).unwrap()
    }

    fn record(key: &str, price: i64) -> PurchaseRecord {
        PurchaseRecord {
            id: PurchaseId::generate(),
            game_id: GameId::new("1").unwrap(),
            game_title: "Hades".into(),
            key: key.into(),
            price,
            purchase_timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_account_has_starting_grant() {
        let account = Account::new(user("a@b.c"), "Ann", STARTING_BALANCE);
        assert_eq!(account.balance, 1000);
        assert_eq!(account.total_spent, 0);
        assert!(account.purchase_history.is_empty());
        assert!(account.is_consistent());
    }

    #[test]
    fn debit_with_record_updates_spend() {
        let account = Account::new(user("a@b.c"), "Ann", 1000);
        let next = apply_delta(&account, -400, Some(record("KEY-A", 400))).unwrap();

        assert_eq!(next.balance, 600);
        assert_eq!(next.total_spent, 400);
        assert_eq!(next.purchase_history.len(), 1);
        assert!(next.is_consistent());
        // input untouched
        assert_eq!(account.balance, 1000);
        assert!(account.purchase_history.is_empty());
    }

    #[test]
    fn credit_without_record_leaves_history() {
        let account = Account::new(user("a@b.c"), "Ann", 1000);
        let next = apply_delta(&account, 50, None).unwrap();
        assert_eq!(next.balance, 1050);
        assert_eq!(next.total_spent, 0);
        assert!(next.purchase_history.is_empty());
    }

    #[test]
    fn overdraft_is_rejected() {
        let account = Account::new(user("a@b.c"), "Ann", 100);
        let err = apply_delta(&account, -101, Some(record("KEY-A", 101))).unwrap_err();
        assert_eq!(
            err,
            ShopError::InsufficientFunds {
                balance: 100,
                required: 101
            }
        );
    }

    #[test]
    fn overflow_is_rejected() {
        let account = Account::new(user("a@b.c"), "Ann", i64::MAX);
        assert!(matches!(
            apply_delta(&account, 1, None),
            Err(ShopError::InvalidAmount(_))
        ));
    }

    #[test]
    fn accounts_document_shape() {
        let accounts: Accounts = [Account::new(user("a@b.c"), "Ann", 1000)]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&accounts).unwrap();
        assert_eq!(json["a@b.c"]["balance"], 1000);
        assert_eq!(json["a@b.c"]["totalSpent"], 0);
        assert!(json["a@b.c"]["purchaseHistory"].as_array().unwrap().is_empty());
    }

    #[test]
    fn legacy_seed_fields_are_accepted() {
        let json = r#"{
            "demo@example.com": {
                "email": "demo@example.com",
                "name": "Demo",
                "balance": 1500,
                "registrationDate": "2024-01-01T00:00:00.000Z",
                "purchasedGames": [],
                "totalSpent": 0
            }
        }"#;
        let accounts: Accounts = serde_json::from_str(json).unwrap();
        let demo = accounts.get(&user("demo@example.com")).unwrap();
        assert_eq!(demo.display_name, "Demo");
        assert_eq!(demo.balance, 1500);
    }

    #[test]
    fn owner_of_finds_key() {
        let mut ann = Account::new(user("a@b.c"), "Ann", 1000);
        ann = apply_delta(&ann, -10, Some(record("KEY-A", 10))).unwrap();
        let accounts: Accounts = [ann, Account::new(user("d@e.f"), "Dan", 1000)]
            .into_iter()
            .collect();

        assert_eq!(accounts.owner_of("KEY-A").unwrap().display_name, "Ann");
        assert!(accounts.owner_of("KEY-B").is_none());
    }
}
