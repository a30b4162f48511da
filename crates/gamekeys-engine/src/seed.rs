//! Bundled seed data.
//!
//! A seed directory holds four JSON files:
//!
//! - `games.json`: array of catalog items (required)
//! - `keys.json`: game id to list of keys (required)
//! - `quiz.json`: array of trivia questions (optional)
//! - `users.json`: user id to account (optional)
//!
//! The catalog and trivia questions are read-only and live in memory. The
//! inventory and accounts are written to the store once, first writer wins.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::de::DeserializeOwned;

use gamekeys_core::{Accounts, Catalog, Game, GameId, Inventory, Result, ShopError, TriviaQuestion};

/// Seed data for a storefront.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    /// Catalog items in listing order.
    pub games: Vec<Game>,

    /// Trivia questions in quiz order.
    pub trivia: Vec<TriviaQuestion>,

    /// Starting keys per game.
    pub keys: BTreeMap<GameId, Vec<String>>,

    /// Starting accounts.
    pub users: Accounts,
}

impl SeedData {
    /// Load seed files from a directory.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidSeed` if a required file is missing or any
    /// file fails to parse.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!(path = %dir.display(), "Loading seed data");

        Ok(Self {
            games: read_json(&dir.join("games.json"))?,
            trivia: read_optional_json(&dir.join("quiz.json"))?,
            keys: read_json(&dir.join("keys.json"))?,
            users: read_optional_json(&dir.join("users.json"))?,
        })
    }

    /// Validate the seed and split it into its catalog and documents.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidSeed` if the catalog is invalid, a key is
    /// listed twice, an account is filed under another user's id or breaks
    /// its invariants, or a key is both in stock and in a purchase history.
    pub fn into_parts(self) -> Result<SeedParts> {
        let catalog = Catalog::new(self.games)?;

        for game_id in self.keys.keys() {
            if catalog.get(game_id).is_none() {
                tracing::warn!(game_id = %game_id, "Seed keys for a game missing from the catalog");
            }
        }

        let inventory = Inventory::from_stock(self.keys)?;

        let mut sold = BTreeSet::new();
        for (user_id, account) in self.users.entries() {
            if *user_id != account.user_id {
                return Err(ShopError::InvalidSeed(format!(
                    "account filed under {user_id} belongs to {}",
                    account.user_id
                )));
            }
            if !account.is_consistent() {
                return Err(ShopError::InvalidSeed(format!(
                    "account {} has inconsistent balance or spend total",
                    account.user_id
                )));
            }
            for record in &account.purchase_history {
                if !sold.insert(record.key.as_str()) || inventory.in_stock(&record.key) {
                    return Err(ShopError::InvalidSeed(format!(
                        "key {} is issued more than once",
                        record.key
                    )));
                }
            }
        }

        Ok(SeedParts {
            catalog,
            trivia: self.trivia,
            inventory,
            accounts: self.users,
        })
    }
}

/// Validated seed data.
#[derive(Debug, Clone)]
pub struct SeedParts {
    /// The catalog.
    pub catalog: Catalog,

    /// Trivia questions.
    pub trivia: Vec<TriviaQuestion>,

    /// Initial inventory document.
    pub inventory: Inventory,

    /// Initial accounts document.
    pub accounts: Accounts,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ShopError::InvalidSeed(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| ShopError::InvalidSeed(format!("{}: {e}", path.display())))
}

fn read_optional_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.exists() {
        read_json(path)
    } else {
        tracing::debug!(path = %path.display(), "Optional seed file absent");
        Ok(T::default())
    }
}
