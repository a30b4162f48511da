//! Key inventory for GameKeys.
//!
//! The inventory document holds, per game, the queue of unsold keys in
//! issuance order, plus a journal of keys taken from stock whose purchase has
//! not been settled yet.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};
use crate::{GameId, UserId};

/// A key that has left stock but is not yet known to be recorded in an
/// account's purchase history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingIssue {
    /// Game the key belongs to.
    pub game_id: GameId,

    /// The key itself.
    pub key: String,

    /// Buyer the key was taken for.
    pub user_id: UserId,

    /// When the key left stock.
    pub reserved_at: DateTime<Utc>,
}

/// The inventory document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    stock: BTreeMap<GameId, VecDeque<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pending: Vec<PendingIssue>,
}

impl Inventory {
    /// Build an inventory from per-game key lists.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidSeed` if a key appears more than once.
    pub fn from_stock(stock: BTreeMap<GameId, Vec<String>>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for (game_id, keys) in &stock {
            for key in keys {
                if !seen.insert(key.as_str()) {
                    return Err(ShopError::InvalidSeed(format!(
                        "key {key} listed more than once (game {game_id})"
                    )));
                }
            }
        }

        Ok(Self {
            stock: stock
                .into_iter()
                .map(|(game_id, keys)| (game_id, keys.into()))
                .collect(),
            pending: Vec::new(),
        })
    }

    /// Number of unsold keys for a game; 0 for unknown games.
    #[must_use]
    pub fn available_count(&self, game_id: &GameId) -> usize {
        self.stock.get(game_id).map_or(0, VecDeque::len)
    }

    /// Whether at least one key is available.
    #[must_use]
    pub fn peek_is_available(&self, game_id: &GameId) -> bool {
        self.available_count(game_id) > 0
    }

    /// Remove the front key for a game and journal it as pending for `buyer`.
    ///
    /// Only meaningful inside a purchase: the change reaches the store solely
    /// through a version-checked commit of the whole document.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::OutOfStock` if no keys remain.
    pub fn take_one(&mut self, game_id: &GameId, buyer: &UserId) -> Result<String> {
        let key = self
            .stock
            .get_mut(game_id)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| ShopError::OutOfStock {
                game_id: game_id.to_string(),
            })?;

        self.pending.push(PendingIssue {
            game_id: game_id.clone(),
            key: key.clone(),
            user_id: buyer.clone(),
            reserved_at: Utc::now(),
        });

        Ok(key)
    }

    /// Drop the pending entry for a key that is now recorded as sold.
    pub fn settle(&mut self, key: &str) -> Option<PendingIssue> {
        let position = self.pending.iter().position(|p| p.key == key)?;
        Some(self.pending.remove(position))
    }

    /// Return a pending key to the front of its game's queue.
    ///
    /// Returns `false` if the key is not pending.
    pub fn restore(&mut self, key: &str) -> bool {
        let Some(issue) = self.settle(key) else {
            return false;
        };
        self.stock
            .entry(issue.game_id)
            .or_default()
            .push_front(issue.key);
        true
    }

    /// Pending entries, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[PendingIssue] {
        &self.pending
    }

    /// Whether a key is pending.
    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.iter().any(|p| p.key == key)
    }

    /// Whether a key is unsold in stock.
    #[must_use]
    pub fn in_stock(&self, key: &str) -> bool {
        self.stock.values().any(|keys| keys.iter().any(|k| k == key))
    }

    /// Unsold keys for a game, front first.
    pub fn keys(&self, game_id: &GameId) -> impl Iterator<Item = &str> {
        self.stock
            .get(game_id)
            .into_iter()
            .flat_map(|keys| keys.iter().map(String::as_str))
    }

    /// Per-game available counts.
    pub fn counts(&self) -> impl Iterator<Item = (&GameId, usize)> {
        self.stock.iter().map(|(id, keys)| (id, keys.len()))
    }
}
