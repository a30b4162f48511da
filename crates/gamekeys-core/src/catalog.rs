//! Catalog types for GameKeys.
//!
//! The catalog is read-only for the lifetime of the process. It is loaded once
//! from seed data and shared by the engines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};
use crate::GameId;

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Stable identifier.
    pub id: GameId,

    /// Display title.
    pub title: String,

    /// List price in currency units.
    pub price: i64,

    /// Discount applied to the list price, 0-100.
    #[serde(default, alias = "discount")]
    pub discount_percent: u8,

    /// Platform label (e.g. "Steam").
    #[serde(default)]
    pub platform: String,

    /// Genre label.
    #[serde(default)]
    pub genre: String,

    /// Cover image path or URL.
    #[serde(default)]
    pub image: String,

    /// Long description.
    #[serde(default)]
    pub description: String,
}

impl Game {
    /// The price charged after the discount.
    ///
    /// Computes `round(price * (1 - discount/100))` in integer arithmetic;
    /// halves round up.
    #[must_use]
    pub fn final_price(&self) -> i64 {
        discounted_price(self.price, self.discount_percent)
    }

    fn validate(&self) -> Result<()> {
        if self.price < 0 {
            return Err(ShopError::InvalidSeed(format!(
                "game {} has negative price {}",
                self.id, self.price
            )));
        }
        if self.discount_percent > 100 {
            return Err(ShopError::InvalidSeed(format!(
                "game {} has discount {}% above 100",
                self.id, self.discount_percent
            )));
        }
        Ok(())
    }
}

/// Apply a percentage discount to a non-negative price.
///
/// Rounds the exact quotient half up. Floating-point evaluation of
/// `price * (1 - discount / 100)` can land just below a half and round down
/// (45 at 30% off gives 31.4999..); this returns 32 and does not reproduce
/// such artefacts.
#[must_use]
pub fn discounted_price(price: i64, discount_percent: u8) -> i64 {
    let keep = i128::from(100 - discount_percent.min(100));
    let scaled = i128::from(price.max(0)) * keep;
    // Cannot exceed `price`, so the narrowing is lossless.
    i64::try_from((scaled + 50) / 100).unwrap_or(i64::MAX)
}

/// The full catalog, indexed by game id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    games: Vec<Game>,
    index: BTreeMap<GameId, usize>,
}

impl Catalog {
    /// Build a catalog, preserving the listing order of `games`.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidSeed` for duplicate ids, negative prices or
    /// discounts above 100%.
    pub fn new(games: Vec<Game>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (position, game) in games.iter().enumerate() {
            game.validate()?;
            if index.insert(game.id.clone(), position).is_some() {
                return Err(ShopError::InvalidSeed(format!(
                    "duplicate game id {}",
                    game.id
                )));
            }
        }
        Ok(Self { games, index })
    }

    /// Look up a game by id.
    #[must_use]
    pub fn get(&self, game_id: &GameId) -> Option<&Game> {
        self.index.get(game_id).map(|&i| &self.games[i])
    }

    /// Iterate games in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.iter()
    }

    /// Number of catalog items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
